use charon_network::{location::Location, minutes::Minutes, network::Network};

use crate::problem::{
    load::Load,
    problem::PickupDeliveryProblem,
    request::{Request, RequestBuilder},
    time_window::TimeWindow,
    vehicle::{Vehicle, VehicleBuilder},
};

pub fn window(earliest: f64, latest: f64) -> TimeWindow {
    TimeWindow::new(Minutes::new(earliest), Minutes::new(latest))
}

pub fn basic_request(
    network: &Network,
    id: &str,
    origin: &str,
    destination: &str,
    demand: i64,
    pickup: TimeWindow,
    delivery: TimeWindow,
) -> Request {
    let mut builder = RequestBuilder::default();
    builder
        .set_request_id(id)
        .set_origin(network.node_idx(origin).unwrap())
        .set_destination(network.node_idx(destination).unwrap())
        .set_demand(Load::new(demand))
        .set_pickup_window(pickup)
        .set_delivery_window(delivery);
    builder.build()
}

pub fn basic_vehicle(network: &Network, id: &str, capacity: i64, start_depot: &str) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder
        .set_vehicle_id(id)
        .set_capacity(Load::new(capacity))
        .set_start_depot(network.node_idx(start_depot).unwrap());
    builder.build()
}

/// Three nodes in a line, every edge 5 minutes / 5 km / cost 5, both ways.
pub fn line_network() -> Network {
    let mut builder = Network::builder();
    builder
        .add_node("D", Location::from_cartesian(0.0, 0.0))
        .add_node("P", Location::from_cartesian(5.0, 0.0))
        .add_node("E", Location::from_cartesian(10.0, 0.0))
        .add_symmetric_edge("D", "P", Minutes::new(5.0), 5.0, 5.0)
        .add_symmetric_edge("P", "E", Minutes::new(5.0), 5.0, 5.0);
    builder.build().unwrap()
}

fn line_problem(demand: i64, pickup: TimeWindow, delivery: TimeWindow) -> PickupDeliveryProblem {
    let network = line_network();
    let request = basic_request(&network, "r1", "P", "E", demand, pickup, delivery);
    let vehicle = basic_vehicle(&network, "v1", 4, "D");

    let mut builder = PickupDeliveryProblem::builder();
    builder
        .set_network(network)
        .add_request(request)
        .add_vehicle(vehicle);
    builder.build().unwrap()
}

/// One vehicle (capacity 4), one request (demand 3) on the line network.
pub fn single_request_problem() -> PickupDeliveryProblem {
    line_problem(3, window(0.0, 10.0), window(5.0, 20.0))
}

/// Demand exceeds the only vehicle's capacity.
pub fn overloaded_request_problem() -> PickupDeliveryProblem {
    line_problem(5, window(0.0, 10.0), window(5.0, 20.0))
}

/// The request is only serviceable at the very end of the horizon.
pub fn late_horizon_problem() -> PickupDeliveryProblem {
    line_problem(3, window(1400.0, 1430.0), window(1405.0, 1440.0))
}

fn star_network(with_second_depot: bool) -> Network {
    let mut builder = Network::builder();
    builder
        .add_node("D", Location::from_cartesian(0.0, 0.0))
        .add_node("P1", Location::from_cartesian(-5.0, 0.0))
        .add_node("P2", Location::from_cartesian(5.0, 0.0))
        .add_node("E1", Location::from_cartesian(-6.0, 0.0))
        .add_node("E2", Location::from_cartesian(6.0, 0.0))
        .add_symmetric_edge("D", "P1", Minutes::new(5.0), 5.0, 5.0)
        .add_symmetric_edge("D", "P2", Minutes::new(5.0), 5.0, 5.0)
        .add_symmetric_edge("P1", "E1", Minutes::new(1.0), 1.0, 1.0)
        .add_symmetric_edge("P2", "E2", Minutes::new(1.0), 1.0, 1.0);
    if with_second_depot {
        builder
            .add_node("D2", Location::from_cartesian(0.0, 1.0))
            .add_symmetric_edge("D2", "P1", Minutes::new(5.0), 5.0, 5.0)
            .add_symmetric_edge("D2", "P2", Minutes::new(5.0), 5.0, 5.0);
    }
    builder.build().unwrap()
}

fn star_requests(network: &Network) -> [Request; 2] {
    [
        basic_request(network, "r1", "P1", "E1", 1, window(0.0, 5.0), window(0.0, 100.0)),
        basic_request(network, "r2", "P2", "E2", 1, window(0.0, 5.0), window(0.0, 100.0)),
    ]
}

/// Two pickups on opposite ends of the depot, both closing at minute 5 and
/// ten minutes of travel apart: no single vehicle can serve both.
pub fn conflicting_windows_problem() -> PickupDeliveryProblem {
    let network = star_network(false);
    let [first, second] = star_requests(&network);
    let vehicle = basic_vehicle(&network, "v1", 10, "D");

    let mut builder = PickupDeliveryProblem::builder();
    builder
        .set_network(network)
        .add_request(first)
        .add_request(second)
        .add_vehicle(vehicle);
    builder.build().unwrap()
}

/// Same conflict, but a second vehicle makes a split serviceable.
pub fn conflicting_windows_two_vehicle_problem() -> PickupDeliveryProblem {
    let network = star_network(true);
    let [first, second] = star_requests(&network);
    let first_vehicle = basic_vehicle(&network, "v1", 10, "D");
    let second_vehicle = basic_vehicle(&network, "v2", 10, "D2");

    let mut builder = PickupDeliveryProblem::builder();
    builder
        .set_network(network)
        .add_request(first)
        .add_request(second)
        .add_vehicle(first_vehicle)
        .add_vehicle(second_vehicle);
    builder.build().unwrap()
}

/// Pickup and delivery joined only through a junction, and a distinct end
/// depot so the closing movement is real.
pub fn junction_problem() -> PickupDeliveryProblem {
    let mut builder = Network::builder();
    builder
        .add_node("D", Location::from_cartesian(0.0, 0.0))
        .add_node("P", Location::from_cartesian(2.0, 0.0))
        .add_node("J", Location::from_cartesian(4.0, 0.0))
        .add_node("E", Location::from_cartesian(6.0, 0.0))
        .add_node("D2", Location::from_cartesian(8.0, 0.0))
        .add_symmetric_edge("D", "P", Minutes::new(2.0), 2.0, 2.0)
        .add_symmetric_edge("P", "J", Minutes::new(3.0), 3.0, 3.0)
        .add_symmetric_edge("J", "E", Minutes::new(3.0), 3.0, 3.0)
        .add_symmetric_edge("E", "D2", Minutes::new(4.0), 4.0, 4.0);
    let network = builder.build().unwrap();

    let request = basic_request(
        &network,
        "r1",
        "P",
        "E",
        2,
        window(0.0, 60.0),
        window(0.0, 60.0),
    );

    let mut vehicle_builder = VehicleBuilder::default();
    vehicle_builder
        .set_vehicle_id("v1")
        .set_capacity(Load::new(4))
        .set_start_depot(network.node_idx("D").unwrap())
        .set_end_depot(network.node_idx("D2").unwrap());
    let vehicle = vehicle_builder.build();

    let mut problem_builder = PickupDeliveryProblem::builder();
    problem_builder
        .set_network(network)
        .add_request(request)
        .add_vehicle(vehicle);
    problem_builder.build().unwrap()
}

/// One request, two vehicles; the second is too small to serve it, so any
/// feasible solution leaves it idle.
pub fn idle_vehicle_problem() -> PickupDeliveryProblem {
    let mut network_builder = Network::builder();
    network_builder
        .add_node("D", Location::from_cartesian(0.0, 0.0))
        .add_node("P", Location::from_cartesian(5.0, 0.0))
        .add_node("E", Location::from_cartesian(10.0, 0.0))
        .add_node("D2", Location::from_cartesian(0.0, 5.0))
        .add_symmetric_edge("D", "P", Minutes::new(5.0), 5.0, 5.0)
        .add_symmetric_edge("P", "E", Minutes::new(5.0), 5.0, 5.0)
        .add_symmetric_edge("D2", "P", Minutes::new(7.0), 7.0, 7.0);
    let network = network_builder.build().unwrap();

    let request = basic_request(
        &network,
        "r1",
        "P",
        "E",
        3,
        window(0.0, 10.0),
        window(5.0, 20.0),
    );
    let first = basic_vehicle(&network, "v1", 4, "D");
    let second = basic_vehicle(&network, "v2", 1, "D2");

    let mut builder = PickupDeliveryProblem::builder();
    builder
        .set_network(network)
        .add_request(request)
        .add_vehicle(first)
        .add_vehicle(second);
    builder.build().unwrap()
}
