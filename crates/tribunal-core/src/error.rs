use thiserror::Error;

/// Structural validation failures for an incoming reasoning tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("node {node} references unknown child {child}")]
    UnknownChild { node: String, child: String },

    #[error("cycle detected through node {0}")]
    CycleDetected(String),

    #[error("tree carries no Merkle commitment")]
    MissingCommitment,

    #[error("proposer stake {provided} below minimum {required}")]
    StakeBelowMinimum { provided: f64, required: f64 },
}
