use charon_network::error::NetworkError;
use charon_optimizer::{
    extract::{error::ExtractError, extractor::SolutionExtractor, movement::Trip},
    model::builder::RouteModelBuilder,
    problem::problem::PickupDeliveryProblem,
    report::RoutingReport,
    solver::{
        params::SolverParams,
        solve::{ModelSolver, Solver, SolveError},
    },
};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Result of one pipeline run: the external report, the underlying trips,
/// and any per-vehicle extraction failures (which do not invalidate the
/// other vehicles' trips).
pub struct RoutingOutcome {
    pub report: RoutingReport,
    pub trips: Vec<Trip>,
    pub failures: Vec<ExtractError>,
}

/// The batch route-synthesis pipeline: one model build, one synchronous
/// solve, one extraction pass, one report assembly. The solver backend is
/// an external collaborator behind the `ModelSolver` contract.
pub struct Pipeline<S> {
    solver: Solver<S>,
    params: SolverParams,
}

impl<S: ModelSolver> Pipeline<S> {
    pub fn new(backend: S, params: SolverParams) -> Self {
        Pipeline {
            solver: Solver::new(backend),
            params,
        }
    }

    /// Access to the solve unit, e.g. to cancel a long-running instance
    /// from another thread.
    pub fn solver(&self) -> &Solver<S> {
        &self.solver
    }

    pub fn run(&self, problem: &PickupDeliveryProblem) -> Result<RoutingOutcome, PipelineError> {
        let model = RouteModelBuilder::new(problem).build()?;
        let assignment = self.solver.solve(&model, &self.params)?;

        let extractor = SolutionExtractor::new(problem, &model, &assignment);
        let outcome = extractor.extract_all();
        let report = RoutingReport::assemble(problem, outcome.trips());

        let (trips, failures) = outcome.into_parts();
        info!(
            trips = trips.len(),
            failures = failures.len(),
            "pipeline finished"
        );

        Ok(RoutingOutcome {
            report,
            trips,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use charon_network::{
        location::Location, minutes::Minutes, network::Network,
    };
    use charon_optimizer::{
        problem::{
            load::Load,
            problem::{PickupDeliveryProblem, ProblemError},
            request::RequestBuilder,
            time_window::TimeWindow,
            vehicle::VehicleBuilder,
        },
        solver::exhaustive::ExhaustiveSolver,
    };
    use jiff::SignedDuration;

    use super::*;

    fn window(earliest: f64, latest: f64) -> TimeWindow {
        TimeWindow::new(Minutes::new(earliest), Minutes::new(latest))
    }

    /// Depot, pickup and delivery in a line, every edge 5/5/5.
    fn line_problem(demand: i64) -> Result<PickupDeliveryProblem, ProblemError> {
        let mut network_builder = Network::builder();
        network_builder
            .add_node("depot", Location::from_cartesian(0.0, 0.0))
            .add_node("pickup", Location::from_cartesian(5.0, 0.0))
            .add_node("delivery", Location::from_cartesian(10.0, 0.0))
            .add_symmetric_edge("depot", "pickup", Minutes::new(5.0), 5.0, 5.0)
            .add_symmetric_edge("pickup", "delivery", Minutes::new(5.0), 5.0, 5.0);
        let network = network_builder.build().unwrap();

        let mut request = RequestBuilder::default();
        request
            .set_request_id("r1")
            .set_origin(network.node_idx("pickup").unwrap())
            .set_destination(network.node_idx("delivery").unwrap())
            .set_demand(Load::new(demand))
            .set_pickup_window(window(0.0, 10.0))
            .set_delivery_window(window(5.0, 20.0));

        let mut vehicle = VehicleBuilder::default();
        vehicle
            .set_vehicle_id("v1")
            .set_capacity(Load::new(4))
            .set_start_depot(network.node_idx("depot").unwrap());

        let mut builder = PickupDeliveryProblem::builder();
        builder
            .set_network(network)
            .add_request(request.build())
            .add_vehicle(vehicle.build());
        builder.build()
    }

    #[test]
    fn test_line_scenario_end_to_end() {
        let problem = line_problem(3).unwrap();
        let pipeline = Pipeline::new(ExhaustiveSolver, SolverParams::default());

        let outcome = pipeline.run(&problem).unwrap();
        assert!(outcome.failures.is_empty());

        let report = &outcome.report;
        assert_eq!(report.trips.len(), 1);

        let trip = &report.trips[0];
        assert_eq!(trip.vehicle_id, "v1");
        assert_eq!(trip.movements.len(), 2);
        assert_eq!(trip.total_cost, 10.0);
        assert_eq!(trip.total_travel_time, 10.0);
        assert_eq!(trip.total_distance, 10.0);

        let first = &trip.movements[0];
        assert_eq!(first.origin_id, "depot");
        assert_eq!(first.destination_id, "pickup");
        assert_eq!(first.start_time, "0:0");
        assert_eq!(first.finish_time, "0:5");
        assert_eq!(first.start_load, 0);
        assert_eq!(first.finish_load, 3);
        assert_eq!(first.request_id.as_deref(), Some("r1"));
        assert_eq!(first.path, vec!["depot", "pickup"]);
        assert_eq!(first.status, "Picking Up Request r1 at Node pickup");

        let second = &trip.movements[1];
        assert_eq!(second.start_load, 3);
        assert_eq!(second.finish_load, 0);
        assert_eq!(second.finish_time, "0:10");
        assert_eq!(second.status, "Delivering Request r1 at Node delivery");
    }

    #[test]
    fn test_report_serializes_to_json() {
        let problem = line_problem(3).unwrap();
        let pipeline = Pipeline::new(ExhaustiveSolver, SolverParams::default());

        let outcome = pipeline.run(&problem).unwrap();
        let json = serde_json::to_value(&outcome.report).unwrap();

        assert_eq!(json["trips"][0]["movements"][0]["start_time"], "0:0");
        assert_eq!(json["trips"][0]["total_cost"], 10.0);
    }

    /// Two requests whose pickup windows close at minute 5, ten minutes of
    /// travel apart; two vehicles with their own depots must split them.
    fn split_fleet_problem() -> PickupDeliveryProblem {
        let mut network_builder = Network::builder();
        network_builder
            .add_node("D1", Location::from_cartesian(0.0, 0.0))
            .add_node("D2", Location::from_cartesian(0.0, 1.0))
            .add_node("P1", Location::from_cartesian(-5.0, 0.0))
            .add_node("P2", Location::from_cartesian(5.0, 0.0))
            .add_node("E1", Location::from_cartesian(-6.0, 0.0))
            .add_node("E2", Location::from_cartesian(6.0, 0.0))
            .add_symmetric_edge("D1", "P1", Minutes::new(5.0), 5.0, 5.0)
            .add_symmetric_edge("D1", "P2", Minutes::new(5.0), 5.0, 5.0)
            .add_symmetric_edge("D2", "P1", Minutes::new(5.0), 5.0, 5.0)
            .add_symmetric_edge("D2", "P2", Minutes::new(5.0), 5.0, 5.0)
            .add_symmetric_edge("P1", "E1", Minutes::new(1.0), 1.0, 1.0)
            .add_symmetric_edge("P2", "E2", Minutes::new(1.0), 1.0, 1.0);
        let network = network_builder.build().unwrap();

        let mut builder = PickupDeliveryProblem::builder();
        for (id, origin, destination) in [("r1", "P1", "E1"), ("r2", "P2", "E2")] {
            let mut request = RequestBuilder::default();
            request
                .set_request_id(id)
                .set_origin(network.node_idx(origin).unwrap())
                .set_destination(network.node_idx(destination).unwrap())
                .set_demand(Load::new(2))
                .set_pickup_window(window(0.0, 5.0))
                .set_delivery_window(window(0.0, 100.0));
            builder.add_request(request.build());
        }
        for (id, depot) in [("v1", "D1"), ("v2", "D2")] {
            let mut vehicle = VehicleBuilder::default();
            vehicle
                .set_vehicle_id(id)
                .set_capacity(Load::new(3))
                .set_start_depot(network.node_idx(depot).unwrap());
            builder.add_vehicle(vehicle.build());
        }
        builder.set_network(network);
        builder.build().unwrap()
    }

    #[test]
    fn test_pairing_and_capacity_hold_across_trips() {
        let problem = split_fleet_problem();
        let pipeline = Pipeline::new(ExhaustiveSolver, SolverParams::default());
        let outcome = pipeline.run(&problem).unwrap();

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.trips.len(), 2);

        let mut served = Vec::new();
        for trip in &outcome.trips {
            let capacity = problem.vehicle(trip.vehicle()).capacity().value();
            let mut pending_pickup = Vec::new();

            for movement in trip.movements() {
                assert!(movement.start_load().value() >= 0);
                assert!(movement.start_load().value() <= capacity);
                assert!(movement.finish_load().value() >= 0);
                assert!(movement.finish_load().value() <= capacity);

                let Some(request) = movement.request() else {
                    continue;
                };
                let is_pickup =
                    movement.destination() == problem.request(request).origin();
                if is_pickup {
                    pending_pickup.push((request, movement.finish_time()));
                } else {
                    // Delivery in the same trip, after its pickup.
                    let pickup_finish = pending_pickup
                        .iter()
                        .find(|(pending, _)| *pending == request)
                        .map(|(_, finish)| *finish)
                        .expect("pickup precedes delivery in the same trip");
                    assert!(movement.start_time() >= pickup_finish);
                    served.push(request);
                }
            }
        }

        served.sort();
        assert_eq!(served.len(), 2);
        assert_eq!(served[0].get(), 0);
        assert_eq!(served[1].get(), 1);
    }

    #[test]
    fn test_overloaded_request_is_infeasible() {
        let problem = line_problem(5).unwrap();
        let pipeline = Pipeline::new(ExhaustiveSolver, SolverParams::default());

        match pipeline.run(&problem) {
            Err(PipelineError::Solve(SolveError::Infeasible { .. })) => {}
            other => panic!("expected infeasibility, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_exhausted_budget_times_out() {
        let problem = line_problem(3).unwrap();
        let pipeline = Pipeline::new(
            ExhaustiveSolver,
            SolverParams::with_time_limit(SignedDuration::ZERO),
        );

        match pipeline.run(&problem) {
            Err(PipelineError::Solve(SolveError::TimedOut { .. })) => {}
            other => panic!("expected a timeout, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_cancelled_run_is_distinct() {
        let problem = line_problem(3).unwrap();
        let pipeline = Pipeline::new(ExhaustiveSolver, SolverParams::default());

        pipeline.solver().stop();

        match pipeline.run(&problem) {
            Err(PipelineError::Solve(SolveError::Cancelled)) => {}
            other => panic!("expected cancellation, got {:?}", other.err()),
        }
    }
}
