use charon_network::{define_index_newtype, minutes::Minutes, node::NodeIdx};
use serde::Serialize;

use crate::problem::{load::Load, time_window::TimeWindow};

define_index_newtype!(RequestIdx, Request);

/// One paired pickup/delivery demand: a quantity to be carried from the
/// origin node to the destination node by a single vehicle, within the two
/// service windows.
#[derive(Serialize, Debug, Clone)]
pub struct Request {
    external_id: String,
    origin: NodeIdx,
    destination: NodeIdx,
    demand: Load,
    pickup_window: TimeWindow,
    delivery_window: TimeWindow,
    pickup_service_time: Minutes,
    delivery_service_time: Minutes,
}

impl Request {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn origin(&self) -> NodeIdx {
        self.origin
    }

    pub fn destination(&self) -> NodeIdx {
        self.destination
    }

    pub fn demand(&self) -> Load {
        self.demand
    }

    pub fn pickup_window(&self) -> &TimeWindow {
        &self.pickup_window
    }

    pub fn delivery_window(&self) -> &TimeWindow {
        &self.delivery_window
    }

    pub fn pickup_service_time(&self) -> Minutes {
        self.pickup_service_time
    }

    pub fn delivery_service_time(&self) -> Minutes {
        self.delivery_service_time
    }
}

#[derive(Default)]
pub struct RequestBuilder {
    external_id: Option<String>,
    origin: Option<NodeIdx>,
    destination: Option<NodeIdx>,
    demand: Option<Load>,
    pickup_window: Option<TimeWindow>,
    delivery_window: Option<TimeWindow>,
    pickup_service_time: Option<Minutes>,
    delivery_service_time: Option<Minutes>,
}

impl RequestBuilder {
    pub fn set_request_id(&mut self, external_id: impl Into<String>) -> &mut RequestBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_origin(&mut self, origin: NodeIdx) -> &mut RequestBuilder {
        self.origin = Some(origin);
        self
    }

    pub fn set_destination(&mut self, destination: NodeIdx) -> &mut RequestBuilder {
        self.destination = Some(destination);
        self
    }

    pub fn set_demand(&mut self, demand: Load) -> &mut RequestBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_pickup_window(&mut self, window: TimeWindow) -> &mut RequestBuilder {
        self.pickup_window = Some(window);
        self
    }

    pub fn set_delivery_window(&mut self, window: TimeWindow) -> &mut RequestBuilder {
        self.delivery_window = Some(window);
        self
    }

    pub fn set_pickup_service_time(&mut self, service_time: Minutes) -> &mut RequestBuilder {
        self.pickup_service_time = Some(service_time);
        self
    }

    pub fn set_delivery_service_time(&mut self, service_time: Minutes) -> &mut RequestBuilder {
        self.delivery_service_time = Some(service_time);
        self
    }

    pub fn build(self) -> Request {
        Request {
            external_id: self.external_id.expect("Request ID is required"),
            origin: self.origin.expect("Origin node is required"),
            destination: self.destination.expect("Destination node is required"),
            demand: self.demand.expect("Demand is required"),
            pickup_window: self.pickup_window.unwrap_or_else(TimeWindow::horizon),
            delivery_window: self.delivery_window.unwrap_or_else(TimeWindow::horizon),
            pickup_service_time: self.pickup_service_time.unwrap_or(Minutes::ZERO),
            delivery_service_time: self.delivery_service_time.unwrap_or(Minutes::ZERO),
        }
    }
}
