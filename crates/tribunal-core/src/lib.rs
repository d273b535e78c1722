//! # Tribunal Core
//!
//! Shared protocol data model for the Tribunal adjudication subnet.
//!
//! Defines:
//! - Reasoning trees and nodes (the artifacts proposers commit to)
//! - Attack, defense and verdict taxonomies
//! - Challenge and defense submissions
//! - Protocol economics constants (multipliers, slash rates, windows)

pub mod constants;
pub mod error;
pub mod time;
pub mod types;

pub use constants::{
    ADJUDICATION_WINDOW_SECS, CHALLENGER_SLASH_RATE, CHALLENGE_WINDOW_SECS, CONSENSUS_THRESHOLD,
    DEFAULT_PANEL_SIZE, DEFENSE_WINDOW_SECS, ESCALATION_EXTENSION_SECS, MIN_CHALLENGE_STAKE_RATIO,
    MIN_PROPOSER_STAKE, NO_DEFENSE_SLASH_RATE, PROPOSER_SLASH_RATE, REJECTED_PROPOSER_SHARE,
};
pub use error::TreeError;
pub use time::{days_between, unix_now};
pub use types::{
    AttackKind, ChallengeSubmission, DefenseKind, DefenseSubmission, Evidence, NodeKind,
    ReasoningNode, ReasoningTree, Verdict,
};
