use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsensusError {
    #[error("unknown validator: {0}")]
    UnknownValidator(String),

    #[error("stake {provided} below tier minimum {required}")]
    StakeBelowTier { provided: f64, required: f64 },

    #[error("validator already registered: {0}")]
    ValidatorAlreadyRegistered(String),

    #[error("no adjudication in flight for dispute {0}")]
    DisputeNotFound(String),

    #[error("dispute {0} already has an assigned panel")]
    DisputeAlreadyAssigned(String),

    #[error("no eligible validators available for assignment")]
    NoEligibleValidators,

    #[error("validator {voter} is not assigned to dispute {dispute}")]
    NotAssigned { dispute: String, voter: String },

    #[error("validator {voter} already voted on dispute {dispute}")]
    AlreadyVoted { dispute: String, voter: String },

    #[error("voting deadline exceeded for dispute {0}")]
    DeadlineExceeded(String),

    #[error("validator {hotkey} not eligible for promotion: {reason}")]
    PromotionIneligible { hotkey: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
