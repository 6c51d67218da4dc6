use charon_network::define_index_newtype;
use serde::Serialize;

use crate::problem::request::RequestIdx;

define_index_newtype!(StopIdx, Stop);

/// A visit point of the routing model. Service stops are shared across
/// vehicles; the depot stops resolve to each vehicle's own depot nodes.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    Pickup(RequestIdx),
    Delivery(RequestIdx),
    StartDepot,
    EndDepot,
}

impl Stop {
    pub fn is_service(&self) -> bool {
        matches!(self, Stop::Pickup(_) | Stop::Delivery(_))
    }

    pub fn is_depot(&self) -> bool {
        !self.is_service()
    }

    pub fn request(&self) -> Option<RequestIdx> {
        match self {
            Stop::Pickup(request) | Stop::Delivery(request) => Some(*request),
            _ => None,
        }
    }
}

/// Dense stop indexing for an instance with `n` requests: pickups occupy
/// `0..n`, deliveries `n..2n`, then the start and end depot stops.
#[derive(Debug, Clone, Copy)]
pub struct StopLayout {
    num_requests: usize,
}

impl StopLayout {
    pub fn new(num_requests: usize) -> Self {
        StopLayout { num_requests }
    }

    pub fn num_requests(&self) -> usize {
        self.num_requests
    }

    pub fn num_stops(&self) -> usize {
        2 * self.num_requests + 2
    }

    pub fn pickup(&self, request: RequestIdx) -> StopIdx {
        StopIdx::new(request.get())
    }

    pub fn delivery(&self, request: RequestIdx) -> StopIdx {
        StopIdx::new(self.num_requests + request.get())
    }

    pub fn start_depot(&self) -> StopIdx {
        StopIdx::new(2 * self.num_requests)
    }

    pub fn end_depot(&self) -> StopIdx {
        StopIdx::new(2 * self.num_requests + 1)
    }

    pub fn stop(&self, index: StopIdx) -> Stop {
        let raw = index.get();
        if raw < self.num_requests {
            Stop::Pickup(RequestIdx::new(raw))
        } else if raw < 2 * self.num_requests {
            Stop::Delivery(RequestIdx::new(raw - self.num_requests))
        } else if raw == 2 * self.num_requests {
            Stop::StartDepot
        } else if raw == 2 * self.num_requests + 1 {
            Stop::EndDepot
        } else {
            panic!("Stop index {raw} out of bounds");
        }
    }

    pub fn stops(&self) -> impl Iterator<Item = StopIdx> + use<> {
        (0..self.num_stops()).map(StopIdx::new)
    }

    pub fn service_stops(&self) -> impl Iterator<Item = StopIdx> {
        (0..2 * self.num_requests).map(StopIdx::new)
    }

    pub fn pickups(&self) -> impl Iterator<Item = StopIdx> {
        (0..self.num_requests).map(StopIdx::new)
    }

    pub fn deliveries(&self) -> impl Iterator<Item = StopIdx> {
        (self.num_requests..2 * self.num_requests).map(StopIdx::new)
    }

    /// Arcs the model admits. Beyond excluding self-loops and arcs that
    /// re-enter the start depot or leave the end depot, a route can never
    /// open with a delivery or close straight after a pickup, so those arcs
    /// are not generated either.
    pub fn is_valid_arc(&self, from: StopIdx, to: StopIdx) -> bool {
        if from == to || to == self.start_depot() || from == self.end_depot() {
            return false;
        }
        if from == self.start_depot() && matches!(self.stop(to), Stop::Delivery(_)) {
            return false;
        }
        if to == self.end_depot() && matches!(self.stop(from), Stop::Pickup(_)) {
            return false;
        }
        true
    }

    pub fn arcs(&self) -> impl Iterator<Item = (StopIdx, StopIdx)> {
        let layout = *self;
        layout.stops().flat_map(move |from| {
            layout
                .stops()
                .filter(move |&to| layout.is_valid_arc(from, to))
                .map(move |to| (from, to))
        })
    }

    pub fn arcs_from(&self, from: StopIdx) -> impl Iterator<Item = StopIdx> {
        let layout = *self;
        layout.stops().filter(move |&to| layout.is_valid_arc(from, to))
    }

    pub fn arcs_into(&self, to: StopIdx) -> impl Iterator<Item = StopIdx> {
        let layout = *self;
        layout
            .stops()
            .filter(move |&from| layout.is_valid_arc(from, to))
    }
}
