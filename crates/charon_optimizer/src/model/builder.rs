use charon_network::{error::NetworkError, minutes::Minutes};

use crate::{
    model::{
        linear::{Constraint, LinearExpr, Sense},
        route_model::RouteModel,
        stop::{Stop, StopIdx, StopLayout},
    },
    problem::{
        load::Load, problem::PickupDeliveryProblem, time_window::TimeWindow, vehicle::VehicleIdx,
    },
};

/// Single-step builder: reads the validated instance and returns the
/// complete, immutable `RouteModel`. There is no incremental
/// constraint-adding API.
pub struct RouteModelBuilder<'a> {
    problem: &'a PickupDeliveryProblem,
}

impl<'a> RouteModelBuilder<'a> {
    pub fn new(problem: &'a PickupDeliveryProblem) -> Self {
        RouteModelBuilder { problem }
    }

    pub fn build(self) -> Result<RouteModel, NetworkError> {
        let problem = self.problem;
        let layout = StopLayout::new(problem.num_requests());
        let stops = layout.num_stops();
        let num_vehicles = problem.num_vehicles();

        let mut stop_nodes = Vec::with_capacity(num_vehicles * stops);
        for vehicle in problem.fleet().iter_ids() {
            let vehicle_data = problem.vehicle(vehicle);
            for stop in layout.stops() {
                stop_nodes.push(match layout.stop(stop) {
                    Stop::Pickup(request) => Some(problem.request(request).origin()),
                    Stop::Delivery(request) => Some(problem.request(request).destination()),
                    Stop::StartDepot => Some(vehicle_data.start_depot()),
                    // An open route ends wherever its last service stop is;
                    // the end stop stays virtual with zero-weight arcs.
                    Stop::EndDepot => vehicle_data.end_depot(),
                });
            }
        }

        let mut stop_windows = Vec::with_capacity(stops);
        let mut service_times = Vec::with_capacity(stops);
        let mut demand_deltas = Vec::with_capacity(stops);
        for stop in layout.stops() {
            let (window, service_time, delta) = match layout.stop(stop) {
                Stop::Pickup(request) => {
                    let request = problem.request(request);
                    (
                        *request.pickup_window(),
                        request.pickup_service_time(),
                        request.demand(),
                    )
                }
                Stop::Delivery(request) => {
                    let request = problem.request(request);
                    (
                        *request.delivery_window(),
                        request.delivery_service_time(),
                        -request.demand(),
                    )
                }
                Stop::StartDepot | Stop::EndDepot => {
                    (TimeWindow::horizon(), Minutes::ZERO, Load::ZERO)
                }
            };
            stop_windows.push(window);
            service_times.push(service_time);
            demand_deltas.push(delta);
        }

        let mut travel_times = vec![Minutes::ZERO; num_vehicles * stops * stops];
        let mut arc_costs = vec![0.0; num_vehicles * stops * stops];
        for vehicle in problem.fleet().iter_ids() {
            for (from, to) in layout.arcs() {
                let from_node = stop_nodes[vehicle.get() * stops + from.get()];
                let to_node = stop_nodes[vehicle.get() * stops + to.get()];
                if let (Some(from_node), Some(to_node)) = (from_node, to_node) {
                    let plan = problem.plans().plan(from_node, to_node)?;
                    let index = (vehicle.get() * stops + from.get()) * stops + to.get();
                    travel_times[index] = plan.travel_time();
                    arc_costs[index] = plan.cost();
                }
            }
        }

        let capacities: Vec<Load> = problem
            .vehicles()
            .iter()
            .map(|vehicle| vehicle.capacity())
            .collect();

        // M must dominate any admissible schedule instant plus one more hop,
        // and any load difference, so no feasible route is ever cut off by
        // an inactive arc constraint.
        let max_service = service_times
            .iter()
            .map(|service_time| service_time.value())
            .fold(0.0_f64, f64::max);
        let max_travel = travel_times
            .iter()
            .map(|travel_time| travel_time.value())
            .fold(0.0_f64, f64::max);
        let max_capacity = capacities
            .iter()
            .map(|capacity: &Load| capacity.value() as f64)
            .fold(0.0_f64, f64::max);
        let max_demand = demand_deltas
            .iter()
            .map(|delta| delta.value().abs() as f64)
            .fold(0.0_f64, f64::max);
        let time_scale = Minutes::DAY.value() + max_service + max_travel;
        let load_scale = 2.0 * max_capacity + max_demand;
        let big_m = time_scale.max(load_scale);

        let mut model = RouteModel {
            layout,
            num_vehicles,
            big_m,
            constraints: Vec::new(),
            objective: LinearExpr::new(),
            stop_nodes,
            stop_windows,
            service_times,
            demand_deltas,
            travel_times,
            arc_costs,
            capacities,
        };

        let constraints = emit_constraints(problem, &model);
        let objective = emit_objective(&model);

        tracing::debug!(
            variables = model.num_variables(),
            constraints = constraints.len(),
            big_m = model.big_m(),
            "built routing model"
        );

        model.constraints = constraints;
        model.objective = objective;

        Ok(model)
    }
}

fn stop_label(problem: &PickupDeliveryProblem, layout: &StopLayout, stop: StopIdx) -> String {
    match layout.stop(stop) {
        Stop::Pickup(request) => format!("{}.pickup", problem.request(request).external_id()),
        Stop::Delivery(request) => format!("{}.delivery", problem.request(request).external_id()),
        Stop::StartDepot => "depot.start".to_owned(),
        Stop::EndDepot => "depot.end".to_owned(),
    }
}

fn emit_constraints(problem: &PickupDeliveryProblem, model: &RouteModel) -> Vec<Constraint> {
    let layout = *model.layout();
    let big_m = model.big_m();
    let mut constraints = Vec::new();

    let vehicle_label =
        |vehicle: VehicleIdx| problem.vehicle(vehicle).external_id().to_owned();
    let label = |stop: StopIdx| stop_label(problem, &layout, stop);

    // Each pickup is entered into a route exactly once, fleet-wide.
    for pickup in layout.pickups() {
        let mut expr = LinearExpr::new();
        for vehicle in model.vehicles() {
            for to in layout.arcs_from(pickup) {
                expr.add_term(model.arc_var(vehicle, pickup, to), 1.0);
            }
        }
        constraints.push(Constraint::new(
            format!("visit_once[{}]", label(pickup)),
            expr,
            Sense::Eq,
            1.0,
        ));
    }

    for vehicle in model.vehicles() {
        let vehicle_id = vehicle_label(vehicle);

        // Whichever vehicle serves a pickup also serves the paired delivery.
        for request in 0..layout.num_requests() {
            let pickup = layout.pickup(request.into());
            let delivery = layout.delivery(request.into());

            let mut expr = LinearExpr::new();
            for to in layout.arcs_from(pickup) {
                expr.add_term(model.arc_var(vehicle, pickup, to), 1.0);
            }
            for from in layout.arcs_into(delivery) {
                expr.add_term(model.arc_var(vehicle, from, delivery), -1.0);
            }
            constraints.push(Constraint::new(
                format!("pairing[{vehicle_id},{}]", label(pickup)),
                expr,
                Sense::Eq,
                0.0,
            ));
        }

        // One departure from the start depot, one arrival at the end depot.
        let mut depart = LinearExpr::new();
        for to in layout.arcs_from(layout.start_depot()) {
            depart.add_term(model.arc_var(vehicle, layout.start_depot(), to), 1.0);
        }
        constraints.push(Constraint::new(
            format!("depart_depot[{vehicle_id}]"),
            depart,
            Sense::Eq,
            1.0,
        ));

        let mut arrive = LinearExpr::new();
        for from in layout.arcs_into(layout.end_depot()) {
            arrive.add_term(model.arc_var(vehicle, from, layout.end_depot()), 1.0);
        }
        constraints.push(Constraint::new(
            format!("arrive_depot[{vehicle_id}]"),
            arrive,
            Sense::Eq,
            1.0,
        ));

        // Flow conservation at every service stop.
        for stop in layout.service_stops() {
            let mut expr = LinearExpr::new();
            for from in layout.arcs_into(stop) {
                expr.add_term(model.arc_var(vehicle, from, stop), 1.0);
            }
            for to in layout.arcs_from(stop) {
                expr.add_term(model.arc_var(vehicle, stop, to), -1.0);
            }
            constraints.push(Constraint::new(
                format!("flow[{vehicle_id},{}]", label(stop)),
                expr,
                Sense::Eq,
                0.0,
            ));
        }

        // Big-M time propagation along used arcs:
        // t_i + service_i + travel_ij <= t_j + M * (1 - x_ij)
        for (from, to) in layout.arcs() {
            let expr = LinearExpr::new()
                .with_term(model.arrival_var(vehicle, from), 1.0)
                .with_term(model.arrival_var(vehicle, to), -1.0)
                .with_term(model.arc_var(vehicle, from, to), big_m);
            let slack = big_m
                - model.service_time(from).value()
                - model.travel_time(vehicle, from, to).value();
            constraints.push(Constraint::new(
                format!("time_prop[{vehicle_id},{},{}]", label(from), label(to)),
                expr,
                Sense::Le,
                slack,
            ));
        }

        // Arrival windows at every stop; depots carry the full horizon.
        for stop in layout.stops() {
            let window = model.window(stop);
            constraints.push(Constraint::new(
                format!("window_open[{vehicle_id},{}]", label(stop)),
                LinearExpr::new().with_term(model.arrival_var(vehicle, stop), 1.0),
                Sense::Ge,
                window.earliest().value(),
            ));
            constraints.push(Constraint::new(
                format!("window_close[{vehicle_id},{}]", label(stop)),
                LinearExpr::new().with_term(model.arrival_var(vehicle, stop), 1.0),
                Sense::Le,
                window.latest().value(),
            ));
        }

        // A delivery can never be reached before its pickup plus the direct
        // travel time between the two.
        for request in 0..layout.num_requests() {
            let pickup = layout.pickup(request.into());
            let delivery = layout.delivery(request.into());
            let expr = LinearExpr::new()
                .with_term(model.arrival_var(vehicle, pickup), 1.0)
                .with_term(model.arrival_var(vehicle, delivery), -1.0);
            constraints.push(Constraint::new(
                format!("precedence[{vehicle_id},{}]", label(pickup)),
                expr,
                Sense::Le,
                -model.travel_time(vehicle, pickup, delivery).value(),
            ));
        }

        // Load propagation along used arcs, linearized symmetrically:
        // |l_i + delta_j - l_j| <= M * (1 - x_ij)
        for (from, to) in layout.arcs() {
            let delta = model.demand_delta(to).value() as f64;

            let upper = LinearExpr::new()
                .with_term(model.load_var(vehicle, from), 1.0)
                .with_term(model.load_var(vehicle, to), -1.0)
                .with_term(model.arc_var(vehicle, from, to), big_m);
            constraints.push(Constraint::new(
                format!("load_prop_hi[{vehicle_id},{},{}]", label(from), label(to)),
                upper,
                Sense::Le,
                big_m - delta,
            ));

            let lower = LinearExpr::new()
                .with_term(model.load_var(vehicle, from), 1.0)
                .with_term(model.load_var(vehicle, to), -1.0)
                .with_term(model.arc_var(vehicle, from, to), -big_m);
            constraints.push(Constraint::new(
                format!("load_prop_lo[{vehicle_id},{},{}]", label(from), label(to)),
                lower,
                Sense::Ge,
                -big_m - delta,
            ));
        }

        // Load stays within [0, capacity] at every stop.
        let capacity = model.capacity(vehicle).value() as f64;
        for stop in layout.stops() {
            constraints.push(Constraint::new(
                format!("load_min[{vehicle_id},{}]", label(stop)),
                LinearExpr::new().with_term(model.load_var(vehicle, stop), 1.0),
                Sense::Ge,
                0.0,
            ));
            constraints.push(Constraint::new(
                format!("load_max[{vehicle_id},{}]", label(stop)),
                LinearExpr::new().with_term(model.load_var(vehicle, stop), 1.0),
                Sense::Le,
                capacity,
            ));
        }

        // When this vehicle actually serves the stop, tighten the bounds:
        // a visited pickup carries at least its demand, a visited delivery
        // leaves at most capacity minus the dropped demand.
        for pickup in layout.pickups() {
            let demand = model.demand_delta(pickup).value() as f64;
            let mut expr = LinearExpr::new().with_term(model.load_var(vehicle, pickup), 1.0);
            for to in layout.arcs_from(pickup) {
                expr.add_term(model.arc_var(vehicle, pickup, to), -big_m);
            }
            constraints.push(Constraint::new(
                format!("load_pickup[{vehicle_id},{}]", label(pickup)),
                expr,
                Sense::Ge,
                demand - big_m,
            ));
        }

        for delivery in layout.deliveries() {
            let demand = -model.demand_delta(delivery).value() as f64;
            let mut expr = LinearExpr::new().with_term(model.load_var(vehicle, delivery), 1.0);
            for from in layout.arcs_into(delivery) {
                expr.add_term(model.arc_var(vehicle, from, delivery), big_m);
            }
            constraints.push(Constraint::new(
                format!("load_delivery[{vehicle_id},{}]", label(delivery)),
                expr,
                Sense::Le,
                capacity - demand + big_m,
            ));
        }

        // Vehicles leave their depot empty.
        constraints.push(Constraint::new(
            format!("initial_load[{vehicle_id}]"),
            LinearExpr::new().with_term(model.load_var(vehicle, layout.start_depot()), 1.0),
            Sense::Eq,
            0.0,
        ));
    }

    constraints
}

fn emit_objective(model: &RouteModel) -> LinearExpr {
    let mut objective = LinearExpr::new();
    for vehicle in model.vehicles() {
        for (from, to) in model.layout().arcs() {
            objective.add_term(
                model.arc_var(vehicle, from, to),
                model.arc_cost(vehicle, from, to),
            );
        }
    }
    objective
}

#[cfg(test)]
mod tests {
    use charon_network::minutes::Minutes;

    use super::*;
    use crate::{
        model::route_model::Variable,
        problem::vehicle::VehicleIdx,
        solver::decision::DecisionAssignment,
        test_utils,
    };

    #[test]
    fn test_model_shape() {
        let problem = test_utils::single_request_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();
        let layout = *model.layout();

        assert_eq!(model.num_stops(), 4);
        assert_eq!(model.num_vehicles(), 1);
        assert_eq!(model.num_variables(), 16 + 8);

        let vehicle = VehicleIdx::new(0);
        let pickup = layout.pickup(0.into());
        let delivery = layout.delivery(0.into());

        assert_eq!(
            model.travel_time(vehicle, layout.start_depot(), pickup),
            Minutes::new(5.0)
        );
        assert_eq!(model.arc_cost(vehicle, pickup, delivery), 5.0);
        assert_eq!(model.demand_delta(pickup).value(), 3);
        assert_eq!(model.demand_delta(delivery).value(), -3);
        assert_eq!(model.window(pickup).latest(), Minutes::new(10.0));
        assert_eq!(model.capacity(vehicle).value(), 4);

        // The open route's end stop stays virtual and free to reach.
        assert_eq!(model.stop_node(vehicle, layout.end_depot()), None);
        assert_eq!(
            model.travel_time(vehicle, delivery, layout.end_depot()),
            Minutes::ZERO
        );
    }

    #[test]
    fn test_big_m_covers_horizon() {
        let problem = test_utils::single_request_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();

        assert!(model.big_m() >= Minutes::DAY.value());
    }

    #[test]
    fn test_variable_decode_round_trip() {
        let problem = test_utils::conflicting_windows_two_vehicle_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();
        let layout = *model.layout();

        let vehicle = VehicleIdx::new(1);
        let pickup = layout.pickup(1.into());
        let delivery = layout.delivery(0.into());

        assert_eq!(
            model.variable(model.arc_var(vehicle, pickup, delivery)),
            Variable::Arc {
                vehicle,
                from: pickup,
                to: delivery
            }
        );
        assert_eq!(
            model.variable(model.arrival_var(vehicle, delivery)),
            Variable::ArrivalTime {
                vehicle,
                stop: delivery
            }
        );
        assert_eq!(
            model.variable(model.load_var(vehicle, pickup)),
            Variable::Load {
                vehicle,
                stop: pickup
            }
        );
    }

    #[test]
    fn test_violations_flag_broken_windows() {
        let problem = test_utils::single_request_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();
        let vehicle = VehicleIdx::new(0);
        let pickup = model.layout().pickup(0.into());

        let mut assignment = DecisionAssignment::zeroed(model.num_variables());
        assignment.set(model.arrival_var(vehicle, pickup), 999.0);

        let violations = model.violations(&assignment);
        assert!(
            violations
                .iter()
                .any(|label| label.starts_with("window_close[v1,r1.pickup]")),
            "got {violations:?}"
        );
    }

    #[test]
    fn test_fractional_arcs_flag_integrality() {
        let problem = test_utils::single_request_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();
        let vehicle = VehicleIdx::new(0);
        let layout = *model.layout();

        let mut assignment = DecisionAssignment::zeroed(model.num_variables());
        assignment.set(
            model.arc_var(vehicle, layout.start_depot(), layout.pickup(0.into())),
            0.4,
        );

        let violations = model.violations(&assignment);
        assert!(violations.iter().any(|label| label.starts_with("integrality")));
    }
}
