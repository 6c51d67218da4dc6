use serde::Serialize;

use crate::edge::Edge;

/// Edge attribute used as the weight when searching for shortest paths.
/// Travel time is the default; the remaining attributes are still summed
/// along whichever path wins.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeWeighting {
    #[default]
    TravelTime,
    Distance,
    Cost,
}

impl EdgeWeighting {
    pub fn edge_weight(&self, edge: &Edge) -> f64 {
        match self {
            EdgeWeighting::TravelTime => edge.travel_time().value(),
            EdgeWeighting::Distance => edge.distance(),
            EdgeWeighting::Cost => edge.cost(),
        }
    }
}
