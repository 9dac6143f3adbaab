use thiserror::Error;

/// Why an edge was rejected by the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidEdgeReason {
    #[error("source node does not exist")]
    MissingSource,
    #[error("target node does not exist")]
    MissingTarget,
    #[error("capacity must be positive")]
    NonPositiveCapacity,
    #[error("an edge with the same direction already exists")]
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: String,
        to: String,
        reason: InvalidEdgeReason,
    },
    #[error("edge {from} -> {to} references unknown node {node}")]
    UnknownEndpoint {
        from: String,
        to: String,
        node: String,
    },
    #[error("node {0} is not part of the network")]
    UnknownNode(String),
    #[error("path {path:?} has fewer than two nodes")]
    EmptyPath { path: Vec<String> },
    #[error("path {path:?} cannot carry {flow} over {from} -> {to} with residual {residual}")]
    NegativeResidual {
        path: Vec<String>,
        from: String,
        to: String,
        residual: u64,
        flow: u64,
    },
    #[error("flow exceeds the largest representable capacity")]
    CapacityOverflow,
    #[error("a max-flow run is already in progress")]
    RunInProgress,
}
