use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{
    edge::EdgeIdx,
    network::Network,
    node::NodeIdx,
    weighting::EdgeWeighting,
};

#[derive(Copy, Clone, Debug)]
struct HeapItem {
    node: NodeIdx,
    weight: f64,
}

impl Eq for HeapItem {}

impl PartialEq for HeapItem {
    fn eq(&self, other: &HeapItem) -> bool {
        self.weight == other.weight
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &HeapItem) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flip weight to make this a min-heap
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Single-source shortest path tree over the full network.
pub struct ShortestPathTree {
    source: NodeIdx,
    weight: Vec<f64>,
    parent_edge: Vec<Option<EdgeIdx>>,
}

impl ShortestPathTree {
    pub fn source(&self) -> NodeIdx {
        self.source
    }

    pub fn reaches(&self, node: NodeIdx) -> bool {
        self.weight[node.get()].is_finite()
    }

    pub fn weight_to(&self, node: NodeIdx) -> f64 {
        self.weight[node.get()]
    }

    /// Edges of the shortest path from the source to `target`, in travel
    /// order. `None` if `target` is unreachable.
    pub fn edge_path_to(&self, network: &Network, target: NodeIdx) -> Option<Vec<EdgeIdx>> {
        if !self.reaches(target) {
            return None;
        }

        let mut path = Vec::new();
        let mut node = target;

        while let Some(edge_idx) = self.parent_edge[node.get()] {
            path.push(edge_idx);
            node = network.edge(edge_idx).origin();
        }

        path.reverse();
        Some(path)
    }
}

pub fn shortest_path_tree(
    network: &Network,
    source: NodeIdx,
    weighting: EdgeWeighting,
) -> ShortestPathTree {
    let mut weight = vec![f64::INFINITY; network.node_count()];
    let mut parent_edge = vec![None; network.node_count()];
    let mut settled = vec![false; network.node_count()];

    let mut heap = BinaryHeap::with_capacity(network.node_count());
    weight[source.get()] = 0.0;
    heap.push(HeapItem {
        node: source,
        weight: 0.0,
    });

    while let Some(HeapItem { node, weight: w }) = heap.pop() {
        if settled[node.get()] {
            continue;
        }
        settled[node.get()] = true;

        for &edge_idx in network.outgoing_edges(node) {
            let edge = network.edge(edge_idx);
            let adj = edge.destination();

            if settled[adj.get()] {
                continue;
            }

            let next_weight = w + weighting.edge_weight(edge);
            if next_weight < weight[adj.get()] {
                weight[adj.get()] = next_weight;
                parent_edge[adj.get()] = Some(edge_idx);
                heap.push(HeapItem {
                    node: adj,
                    weight: next_weight,
                });
            }
        }
    }

    ShortestPathTree {
        source,
        weight,
        parent_edge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{location::Location, minutes::Minutes};

    fn diamond() -> Network {
        // A -> B -> D is slower than A -> C -> D
        let mut builder = Network::builder();
        builder
            .add_node("A", Location::from_cartesian(0.0, 0.0))
            .add_node("B", Location::from_cartesian(1.0, 1.0))
            .add_node("C", Location::from_cartesian(1.0, -1.0))
            .add_node("D", Location::from_cartesian(2.0, 0.0))
            .add_node("X", Location::from_cartesian(9.0, 9.0))
            .add_edge("A", "B", Minutes::new(4.0), 1.0, 1.0)
            .add_edge("B", "D", Minutes::new(4.0), 1.0, 1.0)
            .add_edge("A", "C", Minutes::new(2.0), 2.0, 2.0)
            .add_edge("C", "D", Minutes::new(2.0), 2.0, 2.0);
        builder.build().unwrap()
    }

    #[test]
    fn test_picks_cheapest_path_by_weighting() {
        let network = diamond();
        let a = network.node_idx("A").unwrap();
        let c = network.node_idx("C").unwrap();
        let d = network.node_idx("D").unwrap();

        let tree = shortest_path_tree(&network, a, EdgeWeighting::TravelTime);
        assert_eq!(tree.weight_to(d), 4.0);

        let edges = tree.edge_path_to(&network, d).unwrap();
        let via: Vec<_> = edges
            .iter()
            .map(|&edge| network.edge(edge).destination())
            .collect();
        assert_eq!(via, vec![c, d]);

        // By distance the upper branch wins instead.
        let tree = shortest_path_tree(&network, a, EdgeWeighting::Distance);
        assert_eq!(tree.weight_to(d), 2.0);
    }

    #[test]
    fn test_unreachable_node() {
        let network = diamond();
        let a = network.node_idx("A").unwrap();
        let x = network.node_idx("X").unwrap();

        let tree = shortest_path_tree(&network, a, EdgeWeighting::TravelTime);
        assert!(!tree.reaches(x));
        assert!(tree.edge_path_to(&network, x).is_none());
    }
}
