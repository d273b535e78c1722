use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DisputeError {
    #[error("target node not found: {0}")]
    NodeNotFound(String),

    #[error("challenge stake {provided} below minimum {required}")]
    StakeBelowMinimum { provided: f64, required: f64 },

    #[error("challenge window closed for task {0}")]
    WindowClosed(String),

    #[error("unresolved dispute already targets node {node} of task {task}")]
    DuplicateActiveChallenge { task: String, node: String },

    #[error("dispute not found: {0}")]
    DisputeNotFound(String),

    #[error("invalid dispute state: {current}, expected {expected}")]
    InvalidState { current: &'static str, expected: &'static str },

    #[error("defense deadline exceeded for dispute {0}")]
    DeadlineExceeded(String),
}

pub type Result<T> = std::result::Result<T, DisputeError>;
