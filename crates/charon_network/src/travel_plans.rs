use fxhash::FxHashMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    dijkstra::shortest_path_tree,
    edge::{Cost, Distance},
    error::NetworkError,
    minutes::Minutes,
    network::Network,
    node::NodeIdx,
    weighting::EdgeWeighting,
};

/// Shortest path between two terminal nodes: the literal node sequence plus
/// the edge attributes summed along that same sequence.
#[derive(Serialize, Debug, Clone)]
pub struct TravelPlan {
    nodes: Vec<NodeIdx>,
    travel_time: Minutes,
    distance: Distance,
    cost: Cost,
}

impl TravelPlan {
    fn identity(node: NodeIdx) -> Self {
        TravelPlan {
            nodes: vec![node],
            travel_time: Minutes::ZERO,
            distance: 0.0,
            cost: 0.0,
        }
    }

    pub fn nodes(&self) -> &[NodeIdx] {
        &self.nodes
    }

    pub fn travel_time(&self) -> Minutes {
        self.travel_time
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }
}

/// All-pairs travel plans between the terminal (service and depot) nodes of
/// an instance, stored as a flat `from * n + to` matrix. Pass-through
/// junction nodes appear inside plans but never as endpoints.
pub struct TravelPlans {
    terminals: Vec<NodeIdx>,
    terminal_ids: Vec<String>,
    positions: FxHashMap<NodeIdx, usize>,
    plans: Vec<Option<TravelPlan>>,
}

impl TravelPlans {
    pub fn compute(network: &Network, terminals: &[NodeIdx], weighting: EdgeWeighting) -> Self {
        let terminals: Vec<NodeIdx> = {
            let mut seen = FxHashMap::default();
            terminals
                .iter()
                .copied()
                .filter(|&t| seen.insert(t, ()).is_none())
                .collect()
        };

        let terminal_ids = terminals
            .iter()
            .map(|&t| network.external_id(t).to_owned())
            .collect();

        let positions: FxHashMap<NodeIdx, usize> = terminals
            .iter()
            .enumerate()
            .map(|(position, &t)| (t, position))
            .collect();

        let rows: Vec<Vec<Option<TravelPlan>>> = terminals
            .par_iter()
            .map(|&source| {
                let tree = shortest_path_tree(network, source, weighting);

                terminals
                    .iter()
                    .map(|&target| {
                        if target == source {
                            return Some(TravelPlan::identity(source));
                        }

                        let edges = tree.edge_path_to(network, target)?;

                        let mut nodes = Vec::with_capacity(edges.len() + 1);
                        nodes.push(source);

                        let mut travel_time = Minutes::ZERO;
                        let mut distance = 0.0;
                        let mut cost = 0.0;

                        for &edge_idx in &edges {
                            let edge = network.edge(edge_idx);
                            nodes.push(edge.destination());
                            travel_time += edge.travel_time();
                            distance += edge.distance();
                            cost += edge.cost();
                        }

                        Some(TravelPlan {
                            nodes,
                            travel_time,
                            distance,
                            cost,
                        })
                    })
                    .collect()
            })
            .collect();

        let plans = rows.into_iter().flatten().collect();

        tracing::debug!(
            terminals = terminals.len(),
            "computed all-pairs travel plans"
        );

        TravelPlans {
            terminals,
            terminal_ids,
            positions,
            plans,
        }
    }

    pub fn terminals(&self) -> &[NodeIdx] {
        &self.terminals
    }

    fn position(&self, node: NodeIdx) -> Result<usize, NetworkError> {
        self.positions
            .get(&node)
            .copied()
            .ok_or_else(|| NetworkError::NotATerminal {
                id: node.to_string(),
            })
    }

    pub fn plan(&self, from: NodeIdx, to: NodeIdx) -> Result<&TravelPlan, NetworkError> {
        let from_position = self.position(from)?;
        let to_position = self.position(to)?;

        self.plans[from_position * self.terminals.len() + to_position]
            .as_ref()
            .ok_or_else(|| NetworkError::NoPath {
                from: self.terminal_ids[from_position].clone(),
                to: self.terminal_ids[to_position].clone(),
            })
    }

    pub fn travel_time(&self, from: NodeIdx, to: NodeIdx) -> Result<Minutes, NetworkError> {
        Ok(self.plan(from, to)?.travel_time())
    }

    /// Verifies that every ordered terminal pair is connected.
    pub fn check_connected(&self) -> Result<(), NetworkError> {
        for &from in &self.terminals {
            for &to in &self.terminals {
                self.plan(from, to)?;
            }
        }
        Ok(())
    }
}
