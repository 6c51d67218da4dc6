use rayon::prelude::*;
use tracing::error;

use crate::{
    extract::{
        error::{ExtractError, MalformedRouteReason},
        movement::{Movement, Trip},
    },
    model::{
        route_model::{FEASIBILITY_TOLERANCE, RouteModel},
        stop::{Stop, StopIdx},
    },
    problem::{load::Load, problem::PickupDeliveryProblem, vehicle::VehicleIdx},
    solver::decision::DecisionAssignment,
};

/// Per-vehicle results of one extraction pass. A malformed route aborts
/// only the vehicle it belongs to; every other vehicle's trip survives.
pub struct ExtractionOutcome {
    trips: Vec<Trip>,
    failures: Vec<ExtractError>,
}

impl ExtractionOutcome {
    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn into_trips(self) -> Vec<Trip> {
        self.trips
    }

    pub fn into_parts(self) -> (Vec<Trip>, Vec<ExtractError>) {
        (self.trips, self.failures)
    }

    pub fn failures(&self) -> &[ExtractError] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Turns a raw variable assignment into ordered per-vehicle itineraries:
/// per vehicle, the selected arcs become a successor map, the map is walked
/// depot to depot, and every hop is expanded into a movement along its
/// literal travel-plan path.
pub struct SolutionExtractor<'a> {
    problem: &'a PickupDeliveryProblem,
    model: &'a RouteModel,
    assignment: &'a DecisionAssignment,
}

impl<'a> SolutionExtractor<'a> {
    pub fn new(
        problem: &'a PickupDeliveryProblem,
        model: &'a RouteModel,
        assignment: &'a DecisionAssignment,
    ) -> Self {
        SolutionExtractor {
            problem,
            model,
            assignment,
        }
    }

    /// Extracts every vehicle independently, in parallel. Inputs are
    /// immutable, so the per-vehicle tasks share them without coordination.
    pub fn extract_all(&self) -> ExtractionOutcome {
        let results: Vec<Result<Trip, ExtractError>> = (0..self.model.num_vehicles())
            .into_par_iter()
            .map(|vehicle| self.extract_trip(VehicleIdx::new(vehicle)))
            .collect();

        let mut trips = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(trip) => trips.push(trip),
                Err(failure) => {
                    error!(%failure, "route extraction failed");
                    failures.push(failure);
                }
            }
        }

        ExtractionOutcome { trips, failures }
    }

    pub fn extract_trip(&self, vehicle: VehicleIdx) -> Result<Trip, ExtractError> {
        let layout = *self.model.layout();
        let num_stops = layout.num_stops();

        let malformed = |reason: MalformedRouteReason| ExtractError::MalformedRoute {
            vehicle: self.problem.vehicle(vehicle).external_id().to_owned(),
            reason,
        };
        let node_id = |stop: StopIdx| -> String {
            match self.model.stop_node(vehicle, stop) {
                Some(node) => self.problem.node_id(node).to_owned(),
                None => "<open route end>".to_owned(),
            }
        };

        // The arc set must form a single simple path. Anything else is a
        // modeling or solver defect surfaced as-is, never repaired.
        let mut successor: Vec<Option<StopIdx>> = vec![None; num_stops];
        let mut arc_count = 0usize;
        for (from, to) in layout.arcs() {
            if self.model.arc_used(self.assignment, vehicle, from, to) {
                if successor[from.get()].is_some() {
                    return Err(malformed(MalformedRouteReason::Branching {
                        node: node_id(from),
                    }));
                }
                successor[from.get()] = Some(to);
                arc_count += 1;
            }
        }

        // A vehicle absent from the assignment has an empty itinerary.
        if arc_count == 0 {
            return Ok(Trip::empty(vehicle));
        }

        let start = layout.start_depot();
        let end = layout.end_depot();

        let mut route = vec![start];
        let mut visited = vec![false; num_stops];
        visited[start.get()] = true;
        let mut current = start;
        while current != end {
            let next = successor[current.get()].ok_or_else(|| {
                malformed(MalformedRouteReason::Dangling {
                    node: node_id(current),
                })
            })?;
            if visited[next.get()] {
                return Err(malformed(MalformedRouteReason::Cycle {
                    node: node_id(next),
                }));
            }
            visited[next.get()] = true;
            route.push(next);
            current = next;
        }

        let walked_arcs = route.len() - 1;
        if walked_arcs != arc_count {
            return Err(malformed(MalformedRouteReason::DisconnectedArcs {
                count: arc_count - walked_arcs,
            }));
        }

        if !route.iter().any(|&stop| layout.stop(stop).is_service()) {
            return Ok(Trip::empty(vehicle));
        }

        let mut movements = Vec::with_capacity(route.len() - 1);
        for pair in route.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let from_node = self
                .model
                .stop_node(vehicle, from)
                .expect("only the end stop can be virtual");
            let Some(to_node) = self.model.stop_node(vehicle, to) else {
                // Open route: the virtual end stop is not a movement.
                continue;
            };

            let plan = self.problem.plans().plan(from_node, to_node)?;

            let status = match layout.stop(to) {
                Stop::Pickup(request) => format!(
                    "Picking Up Request {} at Node {}",
                    self.problem.request(request).external_id(),
                    self.problem.node_id(to_node)
                ),
                Stop::Delivery(request) => format!(
                    "Delivering Request {} at Node {}",
                    self.problem.request(request).external_id(),
                    self.problem.node_id(to_node)
                ),
                Stop::StartDepot | Stop::EndDepot => format!(
                    "Going to Destination Depot {}",
                    self.problem.node_id(to_node)
                ),
            };

            movements.push(Movement {
                origin: from_node,
                destination: to_node,
                start_time: self.model.arrival(self.assignment, vehicle, from),
                finish_time: self.model.arrival(self.assignment, vehicle, to),
                start_load: Load::from_rounded(self.model.load(self.assignment, vehicle, from)),
                finish_load: Load::from_rounded(self.model.load(self.assignment, vehicle, to)),
                request: layout.stop(to).request(),
                path: plan.nodes().to_vec(),
                path_cost: plan.cost(),
                travel_time: plan.travel_time(),
                travel_distance: plan.distance(),
                status,
            });
        }

        self.check_continuity(vehicle, &movements)?;

        Ok(Trip::new(vehicle, movements))
    }

    /// Adjacent movements must hand over seamlessly: same instant, same
    /// load. A mismatch is a reconstruction bug, not recoverable data.
    fn check_continuity(
        &self,
        vehicle: VehicleIdx,
        movements: &[Movement],
    ) -> Result<(), ExtractError> {
        for pair in movements.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            let inconsistent = |reason: String| ExtractError::InconsistentTrip {
                vehicle: self.problem.vehicle(vehicle).external_id().to_owned(),
                from: self.problem.node_id(previous.destination()).to_owned(),
                to: self.problem.node_id(next.destination()).to_owned(),
                reason,
            };

            let gap = (previous.finish_time().value() - next.start_time().value()).abs();
            if gap > FEASIBILITY_TOLERANCE {
                return Err(inconsistent(format!(
                    "finish time {} does not meet start time {}",
                    previous.finish_time().value(),
                    next.start_time().value()
                )));
            }

            if previous.finish_load() != next.start_load() {
                return Err(inconsistent(format!(
                    "finish load {} does not meet start load {}",
                    previous.finish_load(),
                    next.start_load()
                )));
            }
        }

        Ok(())
    }
}
