use charon_network::{minutes::Minutes, node::NodeIdx};
use serde::Serialize;

use crate::problem::{load::Load, request::RequestIdx, vehicle::VehicleIdx};

/// One leg of a reconstructed itinerary, between two service anchors
/// (pickup, delivery or depot). The `path` holds the literal node sequence
/// travelled, including pass-through junction nodes. Immutable once emitted.
#[derive(Serialize, Debug, Clone)]
pub struct Movement {
    pub(crate) origin: NodeIdx,
    pub(crate) destination: NodeIdx,
    pub(crate) start_time: Minutes,
    pub(crate) finish_time: Minutes,
    pub(crate) start_load: Load,
    pub(crate) finish_load: Load,
    pub(crate) request: Option<RequestIdx>,
    pub(crate) path: Vec<NodeIdx>,
    pub(crate) path_cost: f64,
    pub(crate) travel_time: Minutes,
    pub(crate) travel_distance: f64,
    pub(crate) status: String,
}

impl Movement {
    pub fn origin(&self) -> NodeIdx {
        self.origin
    }

    pub fn destination(&self) -> NodeIdx {
        self.destination
    }

    pub fn start_time(&self) -> Minutes {
        self.start_time
    }

    pub fn finish_time(&self) -> Minutes {
        self.finish_time
    }

    pub fn start_load(&self) -> Load {
        self.start_load
    }

    pub fn finish_load(&self) -> Load {
        self.finish_load
    }

    pub fn request(&self) -> Option<RequestIdx> {
        self.request
    }

    pub fn path(&self) -> &[NodeIdx] {
        &self.path
    }

    pub fn path_cost(&self) -> f64 {
        self.path_cost
    }

    pub fn travel_time(&self) -> Minutes {
        self.travel_time
    }

    pub fn travel_distance(&self) -> f64 {
        self.travel_distance
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

/// Full ordered itinerary of one vehicle, with aggregate totals summed over
/// its movements. A vehicle serving nothing has an empty trip.
#[derive(Serialize, Debug, Clone)]
pub struct Trip {
    vehicle: VehicleIdx,
    movements: Vec<Movement>,
    total_cost: f64,
    total_travel_time: Minutes,
    total_distance: f64,
}

impl Trip {
    pub fn new(vehicle: VehicleIdx, movements: Vec<Movement>) -> Self {
        let total_cost = movements.iter().map(|movement| movement.path_cost()).sum();
        let total_travel_time = movements.iter().map(|movement| movement.travel_time()).sum();
        let total_distance = movements
            .iter()
            .map(|movement| movement.travel_distance())
            .sum();

        Trip {
            vehicle,
            movements,
            total_cost,
            total_travel_time,
            total_distance,
        }
    }

    pub fn empty(vehicle: VehicleIdx) -> Self {
        Trip::new(vehicle, Vec::new())
    }

    pub fn vehicle(&self) -> VehicleIdx {
        self.vehicle
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_travel_time(&self) -> Minutes {
        self.total_travel_time
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }
}
