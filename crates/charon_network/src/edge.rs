use serde::{Deserialize, Serialize};

use crate::{define_index_newtype, minutes::Minutes, node::NodeIdx};

define_index_newtype!(EdgeIdx, Edge);

pub type Distance = f64;
pub type Cost = f64;

#[derive(Debug, Clone)]
pub struct Edge {
    origin: NodeIdx,
    destination: NodeIdx,
    travel_time: Minutes,
    distance: Distance,
    cost: Cost,
}

impl Edge {
    pub fn new(
        origin: NodeIdx,
        destination: NodeIdx,
        travel_time: Minutes,
        distance: Distance,
        cost: Cost,
    ) -> Self {
        Edge {
            origin,
            destination,
            travel_time,
            distance,
            cost,
        }
    }

    pub fn origin(&self) -> NodeIdx {
        self.origin
    }

    pub fn destination(&self) -> NodeIdx {
        self.destination
    }

    pub fn travel_time(&self) -> Minutes {
        self.travel_time
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }
}

/// Linear edge-cost weights: `cost = travel_time * per_minute + distance * per_km + fixed`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct CostFactors {
    pub per_minute: f64,
    pub per_km: f64,
    pub fixed: f64,
}

impl CostFactors {
    pub fn edge_cost(&self, travel_time: Minutes, distance: Distance) -> Cost {
        travel_time.value() * self.per_minute + distance * self.per_km + self.fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_factors() {
        let factors = CostFactors {
            per_minute: 10.0,
            per_km: 2.0,
            fixed: 100.0,
        };

        assert_eq!(factors.edge_cost(Minutes::new(160.0), 150.0), 2000.0);
    }
}
