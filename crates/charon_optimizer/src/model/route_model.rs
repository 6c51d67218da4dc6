use charon_network::{minutes::Minutes, node::NodeIdx};

use crate::{
    model::{
        linear::{Constraint, LinearExpr, VarId},
        stop::{StopIdx, StopLayout},
    },
    problem::{load::Load, time_window::TimeWindow, vehicle::VehicleIdx},
    solver::decision::DecisionAssignment,
};

pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Decoded meaning of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Arc {
        vehicle: VehicleIdx,
        from: StopIdx,
        to: StopIdx,
    },
    ArrivalTime {
        vehicle: VehicleIdx,
        stop: StopIdx,
    },
    Load {
        vehicle: VehicleIdx,
        stop: StopIdx,
    },
}

/// Fully-specified mixed-integer routing model: variable catalog, linear
/// constraints, objective, and the instance tables the constraints were
/// generated from. Built once by `RouteModelBuilder` and never mutated.
pub struct RouteModel {
    pub(crate) layout: StopLayout,
    pub(crate) num_vehicles: usize,
    pub(crate) big_m: f64,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) objective: LinearExpr,

    /// Node each stop resolves to, per vehicle (`vehicle * num_stops + stop`).
    /// The end-depot slot is `None` for vehicles with an open route.
    pub(crate) stop_nodes: Vec<Option<NodeIdx>>,
    pub(crate) stop_windows: Vec<TimeWindow>,
    pub(crate) service_times: Vec<Minutes>,
    pub(crate) demand_deltas: Vec<Load>,
    /// Stop-to-stop travel minutes, flat `(vehicle * S + from) * S + to`.
    pub(crate) travel_times: Vec<Minutes>,
    pub(crate) arc_costs: Vec<f64>,
    pub(crate) capacities: Vec<Load>,
}

impl RouteModel {
    pub fn layout(&self) -> &StopLayout {
        &self.layout
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    pub fn num_stops(&self) -> usize {
        self.layout.num_stops()
    }

    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn vehicles(&self) -> impl Iterator<Item = VehicleIdx> {
        (0..self.num_vehicles).map(VehicleIdx::new)
    }

    pub fn num_variables(&self) -> usize {
        let stops = self.num_stops();
        self.num_vehicles * stops * stops + 2 * self.num_vehicles * stops
    }

    pub fn arc_var(&self, vehicle: VehicleIdx, from: StopIdx, to: StopIdx) -> VarId {
        let stops = self.num_stops();
        VarId::new((vehicle.get() * stops + from.get()) * stops + to.get())
    }

    pub fn arrival_var(&self, vehicle: VehicleIdx, stop: StopIdx) -> VarId {
        let stops = self.num_stops();
        let base = self.num_vehicles * stops * stops;
        VarId::new(base + vehicle.get() * stops + stop.get())
    }

    pub fn load_var(&self, vehicle: VehicleIdx, stop: StopIdx) -> VarId {
        let stops = self.num_stops();
        let base = self.num_vehicles * stops * stops + self.num_vehicles * stops;
        VarId::new(base + vehicle.get() * stops + stop.get())
    }

    pub fn variable(&self, var: VarId) -> Variable {
        let stops = self.num_stops();
        let arc_block = self.num_vehicles * stops * stops;
        let arrival_block = arc_block + self.num_vehicles * stops;
        let raw = var.get();

        if raw < arc_block {
            Variable::Arc {
                vehicle: VehicleIdx::new(raw / (stops * stops)),
                from: StopIdx::new(raw / stops % stops),
                to: StopIdx::new(raw % stops),
            }
        } else if raw < arrival_block {
            let raw = raw - arc_block;
            Variable::ArrivalTime {
                vehicle: VehicleIdx::new(raw / stops),
                stop: StopIdx::new(raw % stops),
            }
        } else {
            let raw = raw - arrival_block;
            Variable::Load {
                vehicle: VehicleIdx::new(raw / stops),
                stop: StopIdx::new(raw % stops),
            }
        }
    }

    fn stop_table_index(&self, vehicle: VehicleIdx, stop: StopIdx) -> usize {
        vehicle.get() * self.num_stops() + stop.get()
    }

    fn arc_table_index(&self, vehicle: VehicleIdx, from: StopIdx, to: StopIdx) -> usize {
        let stops = self.num_stops();
        (vehicle.get() * stops + from.get()) * stops + to.get()
    }

    /// Network node a stop resolves to for the given vehicle. `None` only
    /// for the virtual end stop of an open route.
    pub fn stop_node(&self, vehicle: VehicleIdx, stop: StopIdx) -> Option<NodeIdx> {
        self.stop_nodes[self.stop_table_index(vehicle, stop)]
    }

    pub fn window(&self, stop: StopIdx) -> &TimeWindow {
        &self.stop_windows[stop.get()]
    }

    pub fn service_time(&self, stop: StopIdx) -> Minutes {
        self.service_times[stop.get()]
    }

    pub fn demand_delta(&self, stop: StopIdx) -> Load {
        self.demand_deltas[stop.get()]
    }

    pub fn capacity(&self, vehicle: VehicleIdx) -> Load {
        self.capacities[vehicle.get()]
    }

    pub fn travel_time(&self, vehicle: VehicleIdx, from: StopIdx, to: StopIdx) -> Minutes {
        self.travel_times[self.arc_table_index(vehicle, from, to)]
    }

    pub fn arc_cost(&self, vehicle: VehicleIdx, from: StopIdx, to: StopIdx) -> f64 {
        self.arc_costs[self.arc_table_index(vehicle, from, to)]
    }

    pub fn arc_used(
        &self,
        assignment: &DecisionAssignment,
        vehicle: VehicleIdx,
        from: StopIdx,
        to: StopIdx,
    ) -> bool {
        assignment.value(self.arc_var(vehicle, from, to)) > 0.5
    }

    pub fn arrival(
        &self,
        assignment: &DecisionAssignment,
        vehicle: VehicleIdx,
        stop: StopIdx,
    ) -> Minutes {
        Minutes::new(assignment.value(self.arrival_var(vehicle, stop)))
    }

    pub fn load(&self, assignment: &DecisionAssignment, vehicle: VehicleIdx, stop: StopIdx) -> f64 {
        assignment.value(self.load_var(vehicle, stop))
    }

    pub fn objective_value(&self, assignment: &DecisionAssignment) -> f64 {
        self.objective.evaluate(assignment.values())
    }

    /// Labels of all constraints the assignment violates, plus integrality
    /// violations of arc variables. Empty means the assignment is feasible.
    pub fn violations(&self, assignment: &DecisionAssignment) -> Vec<String> {
        let mut violations: Vec<String> = self
            .constraints
            .iter()
            .filter(|constraint| {
                !constraint.is_satisfied(assignment.values(), FEASIBILITY_TOLERANCE)
            })
            .map(|constraint| constraint.label().to_owned())
            .collect();

        for vehicle in self.vehicles() {
            for (from, to) in self.layout.arcs() {
                let value = assignment.value(self.arc_var(vehicle, from, to));
                if (value - value.round()).abs() > FEASIBILITY_TOLERANCE {
                    violations.push(format!("integrality[{vehicle},{from},{to}]"));
                }
            }
        }

        violations
    }
}
