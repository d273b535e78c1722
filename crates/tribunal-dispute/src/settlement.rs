use tribunal_core::constants::{
    CHALLENGER_SLASH_RATE, NO_DEFENSE_SLASH_RATE, PARTIAL_CHALLENGER_PENALTY_RATE,
    PROPOSER_SLASH_RATE, REJECTED_PROPOSER_SHARE,
};
use tribunal_core::{AttackKind, Verdict};

use crate::dispute::Settlement;

impl Settlement {
    /// Settlement for a verdict reached by the validator panel.
    ///
    /// `confidence` is the winning verdict's normalized weight, already
    /// clamped to [0, 1] by the caller. An abstaining verdict settles
    /// zeros: no vote carried weight, so nobody is paid or slashed.
    pub fn for_verdict(
        verdict: Verdict,
        confidence: f64,
        attack: AttackKind,
        proposer_stake: f64,
        challenger_stake: f64,
    ) -> Self {
        let m = attack.multiplier();
        let p = proposer_stake;
        let c = challenger_stake;
        match verdict {
            Verdict::ChallengeUpheld => {
                let proposer_slash = p * PROPOSER_SLASH_RATE * confidence;
                Settlement {
                    challenger_payout: c * m * confidence + proposer_slash,
                    proposer_payout: -proposer_slash,
                    proposer_reputation_delta: -0.10 * confidence,
                    challenger_reputation_delta: 0.05 * confidence,
                }
            }
            Verdict::ChallengeRejected => {
                let challenger_slash = c * CHALLENGER_SLASH_RATE * confidence;
                Settlement {
                    challenger_payout: -challenger_slash,
                    // The remainder of the slash is routed externally
                    // (validator pool and burn); only the proposer's
                    // share is reported here.
                    proposer_payout: challenger_slash * REJECTED_PROPOSER_SHARE,
                    proposer_reputation_delta: 0.02 * confidence,
                    challenger_reputation_delta: -0.05 * confidence,
                }
            }
            Verdict::Partial => {
                let proposer_slash = p * PROPOSER_SLASH_RATE * 0.5 * confidence;
                Settlement {
                    challenger_payout: c * m * 0.5 * confidence + proposer_slash
                        - PARTIAL_CHALLENGER_PENALTY_RATE * c,
                    proposer_payout: -proposer_slash,
                    proposer_reputation_delta: -0.03 * confidence,
                    challenger_reputation_delta: 0.01 * confidence,
                }
            }
            Verdict::Abstain => Settlement {
                challenger_payout: 0.0,
                proposer_payout: 0.0,
                proposer_reputation_delta: 0.0,
                challenger_reputation_delta: 0.0,
            },
        }
    }

    /// Settlement when the defense window lapses with no defense.
    ///
    /// The challenge wins at full multiplier and the proposer forfeits
    /// the no-defense fraction of their stake, capped at the full stake.
    pub fn no_defense(attack: AttackKind, proposer_stake: f64, challenger_stake: f64) -> Self {
        let forfeited = proposer_stake.min(proposer_stake * NO_DEFENSE_SLASH_RATE);
        Settlement {
            challenger_payout: challenger_stake * attack.multiplier() + forfeited,
            proposer_payout: -forfeited,
            proposer_reputation_delta: -0.15,
            challenger_reputation_delta: 0.05,
        }
    }
}
