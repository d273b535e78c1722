//! Protocol Economics Constants
//!
//! Attack multipliers, slash rates and timing windows are part of the
//! public protocol contract. Changing any value here is a protocol change.

/// Minimum challenge stake as a fraction of the proposer's stake.
pub const MIN_CHALLENGE_STAKE_RATIO: f64 = 0.10;

/// Minimum stake a proposer must post behind a reasoning tree.
pub const MIN_PROPOSER_STAKE: f64 = 10.0;

/// Fraction of the proposer's stake slashed when a challenge is upheld.
pub const PROPOSER_SLASH_RATE: f64 = 0.30;

/// Fraction of the challenger's stake slashed when a challenge is rejected.
pub const CHALLENGER_SLASH_RATE: f64 = 0.50;

/// Share of a rejected challenger's slash paid to the proposer.
///
/// The remaining 40% is routed externally by the caller (validator pool
/// and burn); the core reports only the proposer's share.
pub const REJECTED_PROPOSER_SHARE: f64 = 0.60;

/// Fraction of the proposer's stake forfeited when the defense window
/// lapses with no defense.
pub const NO_DEFENSE_SLASH_RATE: f64 = 0.45;

/// Stake penalty applied to the challenger on a partial verdict,
/// as a fraction of the challenger's stake.
pub const PARTIAL_CHALLENGER_PENALTY_RATE: f64 = 0.20;

/// How long a committed tree remains open to challenges, from submission.
pub const CHALLENGE_WINDOW_SECS: u64 = 6 * 3600;

/// How long a proposer has to mount a defense, from dispute creation.
pub const DEFENSE_WINDOW_SECS: u64 = 2 * 3600;

/// How long an assigned panel has to vote, from assignment.
pub const ADJUDICATION_WINDOW_SECS: u64 = 4 * 3600;

/// Deadline extension granted when a dispute escalates to arbiters.
pub const ESCALATION_EXTENSION_SECS: u64 = 6 * 3600;

/// Normalized winning share at or above which consensus is reached.
pub const CONSENSUS_THRESHOLD: f64 = 0.6;

/// Default number of validators assigned to adjudicate a dispute.
pub const DEFAULT_PANEL_SIZE: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttackKind;

    #[test]
    fn test_slash_shares_sum_below_one() {
        // Proposer share plus externally routed remainder covers the slash.
        assert!(REJECTED_PROPOSER_SHARE < 1.0);
        assert!(PROPOSER_SLASH_RATE < NO_DEFENSE_SLASH_RATE);
    }

    #[test]
    fn test_multiplier_table() {
        assert_eq!(AttackKind::FactualError.multiplier(), 2.0);
        assert_eq!(AttackKind::LogicalFallacy.multiplier(), 2.5);
        assert_eq!(AttackKind::MissingContext.multiplier(), 1.5);
        assert_eq!(AttackKind::Contradiction.multiplier(), 3.0);
        assert_eq!(AttackKind::Outdated.multiplier(), 1.5);
    }
}
