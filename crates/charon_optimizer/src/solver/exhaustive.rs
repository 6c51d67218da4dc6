use charon_network::minutes::Minutes;
use tracing::debug;

use crate::{
    model::{
        route_model::RouteModel,
        stop::{Stop, StopIdx},
    },
    problem::{request::RequestIdx, vehicle::VehicleIdx},
    solver::{
        decision::DecisionAssignment,
        solve::{ModelSolver, SolveContext, SolveError},
    },
};

/// Exact enumeration solver for tiny instances: every request-to-vehicle
/// assignment is tried, and for each vehicle every pickup-before-delivery
/// interleaving, scheduled at earliest feasible arrival times. It stands in
/// for an industrial solver behind the same contract in tests and small
/// reference runs; its running time is factorial in the request count.
#[derive(Default)]
pub struct ExhaustiveSolver;

struct VehicleRoute {
    vehicle: VehicleIdx,
    /// Full stop sequence, start depot through end stop.
    stops: Vec<StopIdx>,
    arrivals: Vec<f64>,
    loads: Vec<i64>,
    cost: f64,
}

impl ModelSolver for ExhaustiveSolver {
    fn solve(
        &self,
        model: &RouteModel,
        context: &SolveContext,
    ) -> Result<DecisionAssignment, SolveError> {
        let num_requests = model.layout().num_requests();
        let num_vehicles = model.num_vehicles();

        let mut best: Option<(f64, Vec<VehicleRoute>)> = None;
        let mut assignments_tried = 0usize;

        let mut owners = vec![0usize; num_requests];
        loop {
            context.check()?;
            assignments_tried += 1;

            let mut per_vehicle: Vec<Vec<RequestIdx>> = vec![Vec::new(); num_vehicles];
            for (request, &owner) in owners.iter().enumerate() {
                per_vehicle[owner].push(RequestIdx::new(request));
            }

            let mut routes = Vec::with_capacity(num_vehicles);
            let mut total_cost = 0.0;
            for (vehicle, requests) in per_vehicle.iter().enumerate() {
                match best_route(model, VehicleIdx::new(vehicle), requests) {
                    Some(route) => {
                        total_cost += route.cost;
                        routes.push(route);
                    }
                    None => {
                        routes.clear();
                        break;
                    }
                }
            }

            if routes.len() == num_vehicles
                && best.as_ref().is_none_or(|(cost, _)| total_cost < *cost)
            {
                best = Some((total_cost, routes));
            }

            // Advance the base-K odometer over request owners.
            let mut position = 0;
            while position < num_requests {
                owners[position] += 1;
                if owners[position] < num_vehicles {
                    break;
                }
                owners[position] = 0;
                position += 1;
            }
            if position == num_requests {
                break;
            }
        }

        debug!(assignments_tried, "enumeration finished");

        match best {
            Some((cost, routes)) => {
                debug!(objective = cost, "feasible minimum found");
                Ok(emit_assignment(model, &routes))
            }
            None => Err(SolveError::Infeasible {
                num_requests,
                num_vehicles,
            }),
        }
    }
}

/// Cheapest feasible route for one vehicle over its assigned requests, or
/// `None` when no interleaving satisfies windows and capacity.
fn best_route(
    model: &RouteModel,
    vehicle: VehicleIdx,
    requests: &[RequestIdx],
) -> Option<VehicleRoute> {
    let layout = *model.layout();
    let start = layout.start_depot();

    let mut search = RouteSearch {
        model,
        vehicle,
        requests,
        capacity: model.capacity(vehicle).value(),
        picked: vec![false; requests.len()],
        delivered: vec![false; requests.len()],
        stops: vec![start],
        arrivals: vec![model.window(start).earliest().value()],
        loads: vec![0],
        best: None,
    };
    search.explore();

    search.best
}

struct RouteSearch<'a> {
    model: &'a RouteModel,
    vehicle: VehicleIdx,
    requests: &'a [RequestIdx],
    capacity: i64,
    picked: Vec<bool>,
    delivered: Vec<bool>,
    stops: Vec<StopIdx>,
    arrivals: Vec<f64>,
    loads: Vec<i64>,
    best: Option<VehicleRoute>,
}

impl RouteSearch<'_> {
    fn explore(&mut self) {
        if self.delivered.iter().all(|&done| done) {
            self.close_route();
            return;
        }

        for index in 0..self.requests.len() {
            let request = self.requests[index];
            let candidate = if !self.picked[index] {
                self.model.layout().pickup(request)
            } else if !self.delivered[index] {
                self.model.layout().delivery(request)
            } else {
                continue;
            };

            let Some((arrival, load)) = self.step(candidate) else {
                continue;
            };

            let is_pickup = !self.picked[index];
            if is_pickup {
                self.picked[index] = true;
            } else {
                self.delivered[index] = true;
            }
            self.stops.push(candidate);
            self.arrivals.push(arrival);
            self.loads.push(load);

            self.explore();

            self.stops.pop();
            self.arrivals.pop();
            self.loads.pop();
            if is_pickup {
                self.picked[index] = false;
            } else {
                self.delivered[index] = false;
            }
        }
    }

    /// Earliest feasible arrival and resulting load at `next`, or `None`
    /// when the window has closed or the load would exceed capacity.
    fn step(&self, next: StopIdx) -> Option<(f64, i64)> {
        let current = *self.stops.last().expect("route starts at the depot");
        let departure = self.arrivals.last().expect("aligned with stops")
            + self.model.service_time(current).value()
            + self.model.travel_time(self.vehicle, current, next).value();

        let arrival = self
            .model
            .window(next)
            .clamp_earliest(Minutes::new(departure))?
            .value();

        let load = self.loads.last().expect("aligned with stops")
            + self.model.demand_delta(next).value();
        if load > self.capacity {
            return None;
        }

        Some((arrival, load))
    }

    fn close_route(&mut self) {
        let end = self.model.layout().end_depot();
        let Some((arrival, load)) = self.step(end) else {
            return;
        };

        // Guard the direct pickup-to-delivery bound explicitly; under a
        // non-time weighting the stop-to-stop times need not form a metric.
        for &request in self.requests {
            let pickup = self.model.layout().pickup(request);
            let delivery = self.model.layout().delivery(request);
            let position = |stop| self.stops.iter().position(|&s| s == stop);
            if let (Some(p), Some(d)) = (position(pickup), position(delivery))
                && self.arrivals[d]
                    < self.arrivals[p]
                        + self.model.travel_time(self.vehicle, pickup, delivery).value()
            {
                return;
            }
        }

        let mut stops = self.stops.clone();
        let mut arrivals = self.arrivals.clone();
        let mut loads = self.loads.clone();
        stops.push(end);
        arrivals.push(arrival);
        loads.push(load);

        let cost = stops
            .windows(2)
            .map(|pair| self.model.arc_cost(self.vehicle, pair[0], pair[1]))
            .sum();

        if self.best.as_ref().is_none_or(|best| cost < best.cost) {
            self.best = Some(VehicleRoute {
                vehicle: self.vehicle,
                stops,
                arrivals,
                loads,
                cost,
            });
        }
    }
}

/// Expands the chosen routes into a full variable assignment. Stops a
/// vehicle does not visit still get window-feasible arrival times and zero
/// loads, so the assignment satisfies the model as a whole.
fn emit_assignment(model: &RouteModel, routes: &[VehicleRoute]) -> DecisionAssignment {
    let layout = *model.layout();
    let mut assignment = DecisionAssignment::zeroed(model.num_variables());

    for vehicle in model.vehicles() {
        for stop in layout.stops() {
            let arrival = match layout.stop(stop) {
                Stop::Delivery(request) => {
                    let pickup = layout.pickup(request);
                    let direct = model.window(pickup).earliest().value()
                        + model.travel_time(vehicle, pickup, stop).value();
                    model.window(stop).earliest().value().max(direct)
                }
                _ => model.window(stop).earliest().value(),
            };
            assignment.set(model.arrival_var(vehicle, stop), arrival);
        }
    }

    for route in routes {
        for pair in route.stops.windows(2) {
            assignment.set(model.arc_var(route.vehicle, pair[0], pair[1]), 1.0);
        }
        for (position, &stop) in route.stops.iter().enumerate() {
            assignment.set(model.arrival_var(route.vehicle, stop), route.arrivals[position]);
            assignment.set(model.load_var(route.vehicle, stop), route.loads[position] as f64);
        }
    }

    assignment
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use super::*;
    use crate::{
        model::builder::RouteModelBuilder,
        solver::{
            params::SolverParams,
            solve::{Solver, SolverStatus},
        },
        test_utils,
    };

    #[test]
    fn test_single_request_minimum() {
        let problem = test_utils::single_request_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();

        let assignment = ExhaustiveSolver
            .solve(&model, &SolveContext::unbounded())
            .unwrap();

        assert_eq!(model.objective_value(&assignment), 10.0);
        assert!(model.violations(&assignment).is_empty());
    }

    #[test]
    fn test_demand_exceeding_capacity_is_infeasible() {
        let problem = test_utils::overloaded_request_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();

        assert_eq!(
            ExhaustiveSolver.solve(&model, &SolveContext::unbounded()),
            Err(SolveError::Infeasible {
                num_requests: 1,
                num_vehicles: 1,
            })
        );
    }

    #[test]
    fn test_conflicting_windows_are_infeasible() {
        let problem = test_utils::conflicting_windows_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();

        assert_eq!(
            ExhaustiveSolver.solve(&model, &SolveContext::unbounded()),
            Err(SolveError::Infeasible {
                num_requests: 2,
                num_vehicles: 1,
            })
        );
    }

    #[test]
    fn test_two_vehicles_split_conflicting_windows() {
        let problem = test_utils::conflicting_windows_two_vehicle_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();

        let assignment = ExhaustiveSolver
            .solve(&model, &SolveContext::unbounded())
            .unwrap();

        assert!(model.violations(&assignment).is_empty());
    }

    #[test]
    fn test_solver_wrapper_reports_completion() {
        let problem = test_utils::single_request_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();

        let solver = Solver::new(ExhaustiveSolver);
        let params = SolverParams::with_time_limit(SignedDuration::from_secs(30));
        assert!(solver.solve(&model, &params).is_ok());
        assert_eq!(solver.status(), SolverStatus::Completed);
    }

    #[test]
    fn test_big_m_admits_latest_schedule() {
        // A request served at the very end of the horizon must stay
        // feasible; an under-sized M would cut the schedule off.
        let problem = test_utils::late_horizon_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();

        let assignment = ExhaustiveSolver
            .solve(&model, &SolveContext::unbounded())
            .unwrap();
        assert!(model.violations(&assignment).is_empty());
    }
}
