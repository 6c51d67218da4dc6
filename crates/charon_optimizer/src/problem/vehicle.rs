use charon_network::{define_index_newtype, node::NodeIdx};
use serde::Serialize;

use crate::problem::load::Load;

define_index_newtype!(VehicleIdx, Vehicle);

/// A capacity-constrained vehicle based at a start depot. A vehicle with an
/// end depot must finish its route there (the two may coincide); without
/// one the route is open and simply ends at the last service stop.
#[derive(Serialize, Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    capacity: Load,
    start_depot: NodeIdx,
    end_depot: Option<NodeIdx>,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn capacity(&self) -> Load {
        self.capacity
    }

    pub fn start_depot(&self) -> NodeIdx {
        self.start_depot
    }

    pub fn end_depot(&self) -> Option<NodeIdx> {
        self.end_depot
    }

    pub fn has_round_trip_depot(&self) -> bool {
        self.end_depot == Some(self.start_depot)
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    capacity: Option<Load>,
    start_depot: Option<NodeIdx>,
    end_depot: Option<NodeIdx>,
}

impl VehicleBuilder {
    pub fn set_vehicle_id(&mut self, external_id: impl Into<String>) -> &mut VehicleBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_capacity(&mut self, capacity: Load) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_start_depot(&mut self, start_depot: NodeIdx) -> &mut VehicleBuilder {
        self.start_depot = Some(start_depot);
        self
    }

    pub fn set_end_depot(&mut self, end_depot: NodeIdx) -> &mut VehicleBuilder {
        self.end_depot = Some(end_depot);
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            external_id: self.external_id.expect("Vehicle ID is required"),
            capacity: self.capacity.expect("Capacity is required"),
            start_depot: self.start_depot.expect("Start depot is required"),
            end_depot: self.end_depot,
        }
    }
}
