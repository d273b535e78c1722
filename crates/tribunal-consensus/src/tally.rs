use serde::{Deserialize, Serialize};
use tribunal_core::constants::CONSENSUS_THRESHOLD;
use tribunal_core::Verdict;

/// A validator's vote on an assigned dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: String,
    pub verdict: Verdict,
    /// Clamped to [0, 1] at submission.
    pub confidence: f64,
    pub reasoning: String,
    pub submitted_at: u64,
}

/// Per-verdict weight breakdown. Fixed arity: the verdict taxonomy is
/// closed, so a dynamic map buys nothing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VerdictWeights {
    pub upheld: f64,
    pub rejected: f64,
    pub partial: f64,
    pub abstain: f64,
}

impl VerdictWeights {
    pub fn add(&mut self, verdict: Verdict, weight: f64) {
        match verdict {
            Verdict::ChallengeUpheld => self.upheld += weight,
            Verdict::ChallengeRejected => self.rejected += weight,
            Verdict::Partial => self.partial += weight,
            Verdict::Abstain => self.abstain += weight,
        }
    }

    pub fn total(&self) -> f64 {
        self.upheld + self.rejected + self.partial + self.abstain
    }

    /// Scale every weight by the total, yielding shares that sum to 1.
    pub fn normalized(&self) -> VerdictWeights {
        let total = self.total();
        if total <= 0.0 {
            return VerdictWeights::default();
        }
        VerdictWeights {
            upheld: self.upheld / total,
            rejected: self.rejected / total,
            partial: self.partial / total,
            abstain: self.abstain / total,
        }
    }

    /// The heaviest verdict and its weight. Ties break in declaration
    /// order: upheld over rejected over partial over abstain.
    pub fn winner(&self) -> (Verdict, f64) {
        let ranked = [
            (Verdict::ChallengeUpheld, self.upheld),
            (Verdict::ChallengeRejected, self.rejected),
            (Verdict::Partial, self.partial),
            (Verdict::Abstain, self.abstain),
        ];
        let mut best = ranked[0];
        for candidate in &ranked[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best
    }
}

/// Outcome of tallying a dispute's votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub dispute_id: String,
    pub final_verdict: Verdict,
    /// The winning verdict's normalized share of the total weight.
    pub winning_weight: f64,
    pub total_weight: f64,
    /// Normalized per-verdict breakdown.
    pub weights: VerdictWeights,
    /// Validators on the panel at tally time.
    pub validators: Vec<String>,
    pub escalated: bool,
    pub consensus_reached: bool,
}

impl ConsensusResult {
    /// Build a result from raw (unnormalized) verdict weights.
    pub fn from_weights(
        dispute_id: impl Into<String>,
        raw: VerdictWeights,
        validators: Vec<String>,
        escalated: bool,
    ) -> Self {
        let total = raw.total();
        if total <= 0.0 {
            return Self {
                dispute_id: dispute_id.into(),
                final_verdict: Verdict::Abstain,
                winning_weight: 0.0,
                total_weight: 0.0,
                weights: VerdictWeights::default(),
                validators,
                escalated,
                consensus_reached: false,
            };
        }
        let normalized = raw.normalized();
        let (final_verdict, winning_weight) = normalized.winner();
        Self {
            dispute_id: dispute_id.into(),
            final_verdict,
            winning_weight,
            total_weight: total,
            weights: normalized,
            validators,
            escalated,
            consensus_reached: winning_weight >= CONSENSUS_THRESHOLD,
        }
    }
}
