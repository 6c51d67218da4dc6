use charon_network::error::NetworkError;
use thiserror::Error;

/// Shape violations of a vehicle's selected arc set. Any of these means the
/// model or the solver is defective; the extractor never repairs a route.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRouteReason {
    #[error("more than one outgoing arc at node {node}")]
    Branching { node: String },
    #[error("arc set re-enters node {node}")]
    Cycle { node: String },
    #[error("route strands at node {node} before reaching the end depot")]
    Dangling { node: String },
    #[error("{count} selected arcs are disconnected from the depot walk")]
    DisconnectedArcs { count: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("vehicle {vehicle}: malformed route: {reason}")]
    MalformedRoute {
        vehicle: String,
        reason: MalformedRouteReason,
    },
    #[error("vehicle {vehicle}: inconsistent trip between nodes {from} and {to}: {reason}")]
    InconsistentTrip {
        vehicle: String,
        from: String,
        to: String,
        reason: String,
    },
    #[error(transparent)]
    Network(#[from] NetworkError),
}
