use serde::Serialize;

use crate::{define_index_newtype, location::Location};

define_index_newtype!(NodeIdx, Node);

/// Role a node plays in a routing instance. Junction nodes carry no service
/// semantics and no time windows; vehicles may pass through them freely.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Junction,
    Depot,
    Pickup,
    Delivery,
}

impl NodeKind {
    pub fn is_service(&self) -> bool {
        matches!(self, NodeKind::Pickup | NodeKind::Delivery)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    external_id: String,
    location: Location,
    name: Option<String>,
}

impl Node {
    pub fn new(external_id: impl Into<String>, location: Location) -> Self {
        Node {
            external_id: external_id.into(),
            location,
            name: None,
        }
    }

    pub fn with_name(external_id: impl Into<String>, location: Location, name: String) -> Self {
        Node {
            external_id: external_id.into(),
            location,
            name: Some(name),
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
