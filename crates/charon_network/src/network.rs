use fxhash::FxHashMap;

use crate::{
    edge::{Cost, CostFactors, Distance, Edge, EdgeIdx},
    error::NetworkError,
    location::Location,
    minutes::Minutes,
    node::{Node, NodeIdx},
};

/// Validated, immutable road network: a dense node arena with per-node
/// adjacency lists. External string identifiers resolve to `NodeIdx` once,
/// at build time.
pub struct Network {
    nodes: Vec<Node>,
    node_index: FxHashMap<String, NodeIdx>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeIdx>>,
}

impl Network {
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIdx) -> &Node {
        &self.nodes[index]
    }

    pub fn node_idx(&self, external_id: &str) -> Result<NodeIdx, NetworkError> {
        self.node_index
            .get(external_id)
            .copied()
            .ok_or_else(|| NetworkError::UnknownNode {
                id: external_id.to_owned(),
            })
    }

    pub fn external_id(&self, index: NodeIdx) -> &str {
        self.nodes[index].external_id()
    }

    pub fn edge(&self, index: EdgeIdx) -> &Edge {
        &self.edges[index]
    }

    pub fn outgoing_edges(&self, node: NodeIdx) -> &[EdgeIdx] {
        &self.outgoing[node.get()]
    }

    /// Direct edge between an ordered node pair, if one exists.
    pub fn edge_between(&self, from: NodeIdx, to: NodeIdx) -> Option<&Edge> {
        self.outgoing[from.get()]
            .iter()
            .map(|&edge_idx| &self.edges[edge_idx])
            .find(|edge| edge.destination() == to)
    }
}

struct RawEdge {
    origin: String,
    destination: String,
    travel_time: Minutes,
    distance: Distance,
    cost: Cost,
}

#[derive(Default)]
pub struct NetworkBuilder {
    nodes: Vec<Node>,
    edges: Vec<RawEdge>,
}

impl NetworkBuilder {
    pub fn add_node(
        &mut self,
        external_id: impl Into<String>,
        location: Location,
    ) -> &mut NetworkBuilder {
        self.nodes.push(Node::new(external_id, location));
        self
    }

    pub fn add_edge(
        &mut self,
        origin: impl Into<String>,
        destination: impl Into<String>,
        travel_time: Minutes,
        distance: Distance,
        cost: Cost,
    ) -> &mut NetworkBuilder {
        self.edges.push(RawEdge {
            origin: origin.into(),
            destination: destination.into(),
            travel_time,
            distance,
            cost,
        });
        self
    }

    /// Adds an edge whose cost is derived from the given factors.
    pub fn add_edge_with_factors(
        &mut self,
        origin: impl Into<String>,
        destination: impl Into<String>,
        travel_time: Minutes,
        distance: Distance,
        factors: &CostFactors,
    ) -> &mut NetworkBuilder {
        let cost = factors.edge_cost(travel_time, distance);
        self.add_edge(origin, destination, travel_time, distance, cost)
    }

    /// Adds the edge in both directions with identical weights.
    pub fn add_symmetric_edge(
        &mut self,
        a: impl Into<String>,
        b: impl Into<String>,
        travel_time: Minutes,
        distance: Distance,
        cost: Cost,
    ) -> &mut NetworkBuilder {
        let a = a.into();
        let b = b.into();
        self.add_edge(a.clone(), b.clone(), travel_time, distance, cost);
        self.add_edge(b, a, travel_time, distance, cost)
    }

    pub fn build(self) -> Result<Network, NetworkError> {
        let mut node_index = FxHashMap::default();

        for (index, node) in self.nodes.iter().enumerate() {
            let previous = node_index.insert(node.external_id().to_owned(), NodeIdx::new(index));
            if previous.is_some() {
                return Err(NetworkError::DuplicateNode {
                    id: node.external_id().to_owned(),
                });
            }
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        let mut outgoing = vec![Vec::new(); self.nodes.len()];

        for raw in self.edges {
            let origin = *node_index
                .get(&raw.origin)
                .ok_or(NetworkError::UnknownNode { id: raw.origin })?;
            let destination =
                *node_index
                    .get(&raw.destination)
                    .ok_or(NetworkError::UnknownNode {
                        id: raw.destination,
                    })?;

            if raw.travel_time <= Minutes::ZERO {
                return Err(NetworkError::NonPositiveTravelTime {
                    from: self.nodes[origin].external_id().to_owned(),
                    to: self.nodes[destination].external_id().to_owned(),
                });
            }

            let edge_idx = EdgeIdx::new(edges.len());
            edges.push(Edge::new(
                origin,
                destination,
                raw.travel_time,
                raw.distance,
                raw.cost,
            ));
            outgoing[origin.get()].push(edge_idx);
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            edges = edges.len(),
            "built network"
        );

        Ok(Network {
            nodes: self.nodes,
            node_index,
            edges,
            outgoing,
        })
    }
}
