use serde::Serialize;

use crate::{extract::movement::Trip, problem::problem::PickupDeliveryProblem};

/// External presentation of a movement: external identifiers, `H:M` clock
/// strings, and numeric fields rounded to one decimal.
#[derive(Serialize, Debug, Clone)]
pub struct MovementRecord {
    pub origin_id: String,
    pub destination_id: String,
    pub start_time: String,
    pub finish_time: String,
    pub start_load: i64,
    pub finish_load: i64,
    pub request_id: Option<String>,
    pub path: Vec<String>,
    pub path_cost: f64,
    pub travel_time: f64,
    pub travel_distance: f64,
    pub status: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct TripRecord {
    pub vehicle_id: String,
    pub movements: Vec<MovementRecord>,
    pub total_cost: f64,
    pub total_travel_time: f64,
    pub total_distance: f64,
}

#[derive(Serialize, Debug, Clone)]
pub struct RoutingReport {
    pub trips: Vec<TripRecord>,
}

impl RoutingReport {
    /// Pure transformation of extracted trips into the external record
    /// shape; no decisions are made here.
    pub fn assemble(problem: &PickupDeliveryProblem, trips: &[Trip]) -> Self {
        let trips = trips
            .iter()
            .map(|trip| TripRecord {
                vehicle_id: problem.vehicle(trip.vehicle()).external_id().to_owned(),
                movements: trip
                    .movements()
                    .iter()
                    .map(|movement| MovementRecord {
                        origin_id: problem.node_id(movement.origin()).to_owned(),
                        destination_id: problem.node_id(movement.destination()).to_owned(),
                        start_time: movement.start_time().format_clock(),
                        finish_time: movement.finish_time().format_clock(),
                        start_load: movement.start_load().value(),
                        finish_load: movement.finish_load().value(),
                        request_id: movement
                            .request()
                            .map(|request| problem.request(request).external_id().to_owned()),
                        path: movement
                            .path()
                            .iter()
                            .map(|&node| problem.node_id(node).to_owned())
                            .collect(),
                        path_cost: round_one_decimal(movement.path_cost()),
                        travel_time: round_one_decimal(movement.travel_time().value()),
                        travel_distance: round_one_decimal(movement.travel_distance()),
                        status: movement.status().to_owned(),
                    })
                    .collect(),
                total_cost: round_one_decimal(trip.total_cost()),
                total_travel_time: round_one_decimal(trip.total_travel_time().value()),
                total_distance: round_one_decimal(trip.total_distance()),
            })
            .collect();

        RoutingReport { trips }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extract::extractor::SolutionExtractor,
        model::builder::RouteModelBuilder,
        solver::{
            exhaustive::ExhaustiveSolver,
            solve::{ModelSolver, SolveContext},
        },
        test_utils,
    };

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(10.04), 10.0);
        assert_eq!(round_one_decimal(10.05), 10.1);
        assert_eq!(round_one_decimal(7.0), 7.0);
    }

    #[test]
    fn test_assemble_renders_clock_strings_and_external_ids() {
        let problem = test_utils::junction_problem();
        let model = RouteModelBuilder::new(&problem).build().unwrap();
        let assignment = ExhaustiveSolver
            .solve(&model, &SolveContext::unbounded())
            .unwrap();
        let outcome = SolutionExtractor::new(&problem, &model, &assignment).extract_all();

        let report = RoutingReport::assemble(&problem, outcome.trips());
        assert_eq!(report.trips.len(), 1);

        let trip = &report.trips[0];
        assert_eq!(trip.vehicle_id, "v1");
        assert_eq!(trip.movements.len(), 3);
        assert_eq!(trip.total_cost, 12.0);

        let through_junction = &trip.movements[1];
        assert_eq!(through_junction.path, vec!["P", "J", "E"]);
        assert_eq!(through_junction.start_time, "0:2");
        assert_eq!(through_junction.finish_time, "0:8");
        assert_eq!(through_junction.travel_time, 6.0);
        assert_eq!(through_junction.request_id.as_deref(), Some("r1"));

        let json = serde_json::to_value(trip).unwrap();
        assert_eq!(json["movements"][2]["status"], "Going to Destination Depot D2");
        assert_eq!(json["movements"][2]["request_id"], serde_json::Value::Null);
    }
}
