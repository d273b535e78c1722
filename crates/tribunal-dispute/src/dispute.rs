use serde::{Deserialize, Serialize};
use tribunal_core::{AttackKind, DefenseSubmission, Evidence, Verdict};

/// Lifecycle states of a dispute.
///
/// `Expired` is reserved for disputes discarded without resolution; no
/// current transition produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    PendingDefense,
    PendingAdjudication,
    Resolved,
    Expired,
}

impl DisputeStatus {
    pub fn name(&self) -> &'static str {
        match self {
            DisputeStatus::PendingDefense => "pending_defense",
            DisputeStatus::PendingAdjudication => "pending_adjudication",
            DisputeStatus::Resolved => "resolved",
            DisputeStatus::Expired => "expired",
        }
    }
}

/// Stake and reputation deltas computed at resolution.
///
/// Positive means gain, negative means loss; units are the platform's
/// stake token. The fields are immutable once set on a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub challenger_payout: f64,
    pub proposer_payout: f64,
    pub proposer_reputation_delta: f64,
    pub challenger_reputation_delta: f64,
}

/// A challenge accepted against a committed reasoning tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub dispute_id: String,
    pub task_id: String,
    pub target_node_id: String,
    pub proposer: String,
    pub challenger: String,
    pub proposer_stake: f64,
    pub challenger_stake: f64,
    pub attack: AttackKind,
    pub challenge_argument: String,
    pub challenge_evidence: Option<Evidence>,
    pub defense: Option<DefenseSubmission>,
    /// Absolute instant by which a defense must arrive.
    pub defense_deadline: u64,
    pub status: DisputeStatus,
    pub verdict: Option<Verdict>,
    pub created_at: u64,
    pub resolved_at: Option<u64>,
    pub settlement: Option<Settlement>,
}

impl Dispute {
    /// Whether this dispute still blocks new challenges on its target.
    pub fn is_active(&self) -> bool {
        matches!(self.status, DisputeStatus::PendingDefense | DisputeStatus::PendingAdjudication)
    }
}

/// What a resolution decided and settled, surfaced to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub dispute_id: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub settlement: Settlement,
    pub resolved_at: u64,
}
