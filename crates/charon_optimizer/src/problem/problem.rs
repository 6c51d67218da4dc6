use charon_network::{
    error::NetworkError,
    network::Network,
    node::{NodeIdx, NodeKind},
    travel_plans::TravelPlans,
    weighting::EdgeWeighting,
};
use fxhash::FxHashMap;
use thiserror::Error;

use crate::problem::{
    fleet::Fleet,
    request::{Request, RequestIdx},
    time_window::TimeWindow,
    vehicle::{Vehicle, VehicleIdx},
};

#[derive(Error, Debug)]
pub enum ProblemError {
    #[error("request {request}: demand must be positive")]
    EmptyDemand { request: String },
    #[error("request {request}: pickup and delivery share node {node}")]
    SamePickupDelivery { request: String, node: String },
    #[error("duplicate request id {request}")]
    DuplicateRequest { request: String },
    #[error("duplicate vehicle id {vehicle}")]
    DuplicateVehicle { vehicle: String },
    #[error("node {node} already serves another role")]
    NodeRoleConflict { node: String },
    #[error("request {request}: window [{earliest}, {latest}] leaves the scheduling horizon")]
    WindowOutsideHorizon {
        request: String,
        earliest: f64,
        latest: f64,
    },
    #[error("request {request}: window closes before it opens")]
    EmptyWindow { request: String },
    #[error(
        "request {request}: earliest pickup plus travel time exceeds the latest delivery time"
    )]
    UnreachableWindow { request: String },
    #[error("fleet must contain at least one vehicle")]
    EmptyFleet,
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Validated, immutable routing instance: the network, the all-pairs travel
/// plans between its terminal nodes, the request catalog, and the fleet.
pub struct PickupDeliveryProblem {
    network: Network,
    plans: TravelPlans,
    requests: Vec<Request>,
    fleet: Fleet,
    node_kinds: Vec<NodeKind>,
}

impl PickupDeliveryProblem {
    pub fn builder() -> PickupDeliveryProblemBuilder {
        PickupDeliveryProblemBuilder::default()
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn plans(&self) -> &TravelPlans {
        &self.plans
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn request(&self, request_id: RequestIdx) -> &Request {
        &self.requests[request_id]
    }

    pub fn num_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        self.fleet.vehicles()
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        self.fleet.vehicle(vehicle_id)
    }

    pub fn num_vehicles(&self) -> usize {
        self.fleet.len()
    }

    /// Role of a node in this instance, derived from the catalog: service
    /// and depot roles override the junction default.
    pub fn node_kind(&self, node: NodeIdx) -> NodeKind {
        self.node_kinds[node.get()]
    }

    pub fn node_id(&self, node: NodeIdx) -> &str {
        self.network.external_id(node)
    }
}

#[derive(Default)]
pub struct PickupDeliveryProblemBuilder {
    network: Option<Network>,
    requests: Vec<Request>,
    vehicles: Vec<Vehicle>,
    weighting: EdgeWeighting,
}

impl PickupDeliveryProblemBuilder {
    pub fn set_network(&mut self, network: Network) -> &mut PickupDeliveryProblemBuilder {
        self.network = Some(network);
        self
    }

    pub fn add_request(&mut self, request: Request) -> &mut PickupDeliveryProblemBuilder {
        self.requests.push(request);
        self
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> &mut PickupDeliveryProblemBuilder {
        self.vehicles.push(vehicle);
        self
    }

    pub fn set_weighting(&mut self, weighting: EdgeWeighting) -> &mut PickupDeliveryProblemBuilder {
        self.weighting = weighting;
        self
    }

    pub fn build(self) -> Result<PickupDeliveryProblem, ProblemError> {
        let network = self.network.expect("Expected a network");

        if self.vehicles.is_empty() {
            return Err(ProblemError::EmptyFleet);
        }

        let mut request_ids = FxHashMap::default();
        for request in &self.requests {
            if request_ids
                .insert(request.external_id().to_owned(), ())
                .is_some()
            {
                return Err(ProblemError::DuplicateRequest {
                    request: request.external_id().to_owned(),
                });
            }
        }

        let mut vehicle_ids = FxHashMap::default();
        for vehicle in &self.vehicles {
            if vehicle_ids
                .insert(vehicle.external_id().to_owned(), ())
                .is_some()
            {
                return Err(ProblemError::DuplicateVehicle {
                    vehicle: vehicle.external_id().to_owned(),
                });
            }
        }

        for request in &self.requests {
            validate_request(&network, request)?;
        }

        let node_kinds = derive_node_kinds(&network, &self.requests, &self.vehicles)?;

        let terminals = collect_terminals(&self.requests, &self.vehicles);
        let plans = TravelPlans::compute(&network, &terminals, self.weighting);
        validate_connectivity(&plans, &self.requests, &self.vehicles)?;

        for request in &self.requests {
            let travel_time = plans.travel_time(request.origin(), request.destination())?;
            let reachable = request.pickup_window().earliest() + travel_time;
            if reachable > request.delivery_window().latest() {
                return Err(ProblemError::UnreachableWindow {
                    request: request.external_id().to_owned(),
                });
            }
        }

        tracing::debug!(
            requests = self.requests.len(),
            vehicles = self.vehicles.len(),
            terminals = terminals.len(),
            "validated routing instance"
        );

        Ok(PickupDeliveryProblem {
            network,
            plans,
            requests: self.requests,
            fleet: Fleet::new(self.vehicles),
            node_kinds,
        })
    }
}

fn validate_request(network: &Network, request: &Request) -> Result<(), ProblemError> {
    if !request.demand().is_positive() {
        return Err(ProblemError::EmptyDemand {
            request: request.external_id().to_owned(),
        });
    }

    if request.origin() == request.destination() {
        return Err(ProblemError::SamePickupDelivery {
            request: request.external_id().to_owned(),
            node: network.external_id(request.origin()).to_owned(),
        });
    }

    let horizon = TimeWindow::horizon();
    for window in [request.pickup_window(), request.delivery_window()] {
        if !window.is_ordered() {
            return Err(ProblemError::EmptyWindow {
                request: request.external_id().to_owned(),
            });
        }
        if !horizon.contains(window.earliest()) || !horizon.contains(window.latest()) {
            return Err(ProblemError::WindowOutsideHorizon {
                request: request.external_id().to_owned(),
                earliest: window.earliest().value(),
                latest: window.latest().value(),
            });
        }
    }

    Ok(())
}

/// Derives per-node roles from the catalog. Every pickup/delivery node must
/// belong to exactly one request, and every depot node to exactly one
/// vehicle; any overlap is a role conflict.
fn derive_node_kinds(
    network: &Network,
    requests: &[Request],
    vehicles: &[Vehicle],
) -> Result<Vec<NodeKind>, ProblemError> {
    let mut kinds = vec![NodeKind::Junction; network.node_count()];
    let conflict = |node: NodeIdx| ProblemError::NodeRoleConflict {
        node: network.external_id(node).to_owned(),
    };

    let mut depot_owner: FxHashMap<NodeIdx, usize> = FxHashMap::default();
    for (owner, vehicle) in vehicles.iter().enumerate() {
        for node in std::iter::once(vehicle.start_depot()).chain(vehicle.end_depot()) {
            if *depot_owner.entry(node).or_insert(owner) != owner {
                return Err(conflict(node));
            }
            kinds[node.get()] = NodeKind::Depot;
        }
    }

    for request in requests {
        for (node, kind) in [
            (request.origin(), NodeKind::Pickup),
            (request.destination(), NodeKind::Delivery),
        ] {
            if kinds[node.get()] != NodeKind::Junction {
                return Err(conflict(node));
            }
            kinds[node.get()] = kind;
        }
    }

    Ok(kinds)
}

/// Verifies reachability for exactly the node pairs a route can use:
/// between any two service nodes, from every start depot to every pickup,
/// and from every delivery back to the vehicle's end depot, if it has one.
fn validate_connectivity(
    plans: &TravelPlans,
    requests: &[Request],
    vehicles: &[Vehicle],
) -> Result<(), ProblemError> {
    let service_nodes: Vec<NodeIdx> = requests
        .iter()
        .flat_map(|request| [request.origin(), request.destination()])
        .collect();

    for &from in &service_nodes {
        for &to in &service_nodes {
            if from != to {
                plans.plan(from, to)?;
            }
        }
    }

    for vehicle in vehicles {
        for request in requests {
            plans.plan(vehicle.start_depot(), request.origin())?;
            if let Some(end_depot) = vehicle.end_depot() {
                plans.plan(request.destination(), end_depot)?;
            }
        }
        if let Some(end_depot) = vehicle.end_depot() {
            plans.plan(vehicle.start_depot(), end_depot)?;
        }
    }

    Ok(())
}

fn collect_terminals(requests: &[Request], vehicles: &[Vehicle]) -> Vec<NodeIdx> {
    let mut terminals = Vec::with_capacity(2 * requests.len() + 2 * vehicles.len());

    for vehicle in vehicles {
        terminals.push(vehicle.start_depot());
        if let Some(end_depot) = vehicle.end_depot() {
            terminals.push(end_depot);
        }
    }
    for request in requests {
        terminals.push(request.origin());
        terminals.push(request.destination());
    }

    terminals
}

#[cfg(test)]
mod tests {
    use charon_network::{location::Location, minutes::Minutes};

    use super::*;
    use crate::test_utils::{self, basic_request, basic_vehicle, window};

    #[test]
    fn test_valid_problem_derives_roles() {
        let problem = test_utils::single_request_problem();
        let network = problem.network();

        assert_eq!(
            problem.node_kind(network.node_idx("D").unwrap()),
            NodeKind::Depot
        );
        assert_eq!(
            problem.node_kind(network.node_idx("P").unwrap()),
            NodeKind::Pickup
        );
        assert_eq!(
            problem.node_kind(network.node_idx("E").unwrap()),
            NodeKind::Delivery
        );
        assert_eq!(problem.num_requests(), 1);
        assert_eq!(problem.num_vehicles(), 1);
    }

    #[test]
    fn test_junction_keeps_default_role() {
        let problem = test_utils::junction_problem();
        let junction = problem.network().node_idx("J").unwrap();

        assert_eq!(problem.node_kind(junction), NodeKind::Junction);
    }

    #[test]
    fn test_rejects_zero_demand() {
        let network = test_utils::line_network();
        let request =
            basic_request(&network, "r1", "P", "E", 0, window(0.0, 10.0), window(5.0, 20.0));
        let vehicle = basic_vehicle(&network, "v1", 4, "D");

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(request)
            .add_vehicle(vehicle);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::EmptyDemand { .. })
        ));
    }

    #[test]
    fn test_rejects_same_pickup_and_delivery() {
        let network = test_utils::line_network();
        let request =
            basic_request(&network, "r1", "P", "P", 1, window(0.0, 10.0), window(5.0, 20.0));
        let vehicle = basic_vehicle(&network, "v1", 4, "D");

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(request)
            .add_vehicle(vehicle);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::SamePickupDelivery { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_request_ids() {
        let network = test_utils::line_network();
        let first =
            basic_request(&network, "r1", "P", "E", 1, window(0.0, 10.0), window(5.0, 20.0));
        let second =
            basic_request(&network, "r1", "E", "P", 1, window(0.0, 10.0), window(5.0, 20.0));
        let vehicle = basic_vehicle(&network, "v1", 4, "D");

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(first)
            .add_request(second)
            .add_vehicle(vehicle);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::DuplicateRequest { .. })
        ));
    }

    #[test]
    fn test_rejects_service_node_reuse() {
        let network = test_utils::line_network();
        // Both requests pick up at P: a service node belongs to one request.
        let first =
            basic_request(&network, "r1", "P", "E", 1, window(0.0, 10.0), window(5.0, 20.0));
        let second =
            basic_request(&network, "r2", "P", "D", 1, window(0.0, 10.0), window(5.0, 20.0));
        let vehicle = basic_vehicle(&network, "v1", 4, "D");

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(first)
            .add_request(second)
            .add_vehicle(vehicle);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::NodeRoleConflict { .. })
        ));
    }

    #[test]
    fn test_rejects_shared_depot_node() {
        let network = test_utils::line_network();
        let request =
            basic_request(&network, "r1", "P", "E", 1, window(0.0, 10.0), window(5.0, 20.0));
        let first = basic_vehicle(&network, "v1", 4, "D");
        let second = basic_vehicle(&network, "v2", 4, "D");

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(request)
            .add_vehicle(first)
            .add_vehicle(second);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::NodeRoleConflict { .. })
        ));
    }

    #[test]
    fn test_rejects_window_outside_horizon() {
        let network = test_utils::line_network();
        let request = basic_request(
            &network,
            "r1",
            "P",
            "E",
            1,
            window(0.0, 10.0),
            window(5.0, 2000.0),
        );
        let vehicle = basic_vehicle(&network, "v1", 4, "D");

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(request)
            .add_vehicle(vehicle);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::WindowOutsideHorizon { .. })
        ));
    }

    #[test]
    fn test_rejects_unreachable_window() {
        let network = test_utils::line_network();
        // Earliest pickup at 30, five minutes of travel, delivery closes at 20.
        let request = basic_request(
            &network,
            "r1",
            "P",
            "E",
            1,
            window(30.0, 40.0),
            window(0.0, 20.0),
        );
        let vehicle = basic_vehicle(&network, "v1", 4, "D");

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(request)
            .add_vehicle(vehicle);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::UnreachableWindow { .. })
        ));
    }

    #[test]
    fn test_rejects_disconnected_service_node() {
        let mut network_builder = charon_network::network::Network::builder();
        network_builder
            .add_node("D", Location::from_cartesian(0.0, 0.0))
            .add_node("P", Location::from_cartesian(1.0, 0.0))
            .add_node("E", Location::from_cartesian(2.0, 0.0))
            .add_symmetric_edge("D", "P", Minutes::new(5.0), 5.0, 5.0);
        let network = network_builder.build().unwrap();

        let request =
            basic_request(&network, "r1", "P", "E", 1, window(0.0, 10.0), window(5.0, 20.0));
        let vehicle = basic_vehicle(&network, "v1", 4, "D");

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(request)
            .add_vehicle(vehicle);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::Network(NetworkError::NoPath { .. }))
        ));
    }

    #[test]
    fn test_rejects_empty_fleet() {
        let network = test_utils::line_network();
        let request =
            basic_request(&network, "r1", "P", "E", 1, window(0.0, 10.0), window(5.0, 20.0));

        let mut builder = PickupDeliveryProblem::builder();
        builder.set_network(network).add_request(request);

        assert!(matches!(builder.build(), Err(ProblemError::EmptyFleet)));
    }
}
