use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{info, warn};

use tribunal_core::constants::{
    CHALLENGE_WINDOW_SECS, DEFENSE_WINDOW_SECS, MIN_CHALLENGE_STAKE_RATIO,
};
use tribunal_core::{unix_now, ChallengeSubmission, DefenseSubmission, ReasoningTree, Verdict};

use crate::dispute::{Dispute, DisputeStatus, ResolutionSummary, Settlement};
use crate::error::{DisputeError, Result};

/// Tracks every dispute from challenge acceptance through resolution.
///
/// The manager exclusively owns its disputes; other engines reference
/// them by identifier only. Writes are serialized through the internal
/// locks; queries take read locks.
pub struct DisputeManager {
    /// All disputes by identifier.
    /// LOCK ORDER: disputes → next_seq → by_task (consistent across all operations)
    disputes: RwLock<HashMap<String, Dispute>>,
    /// Task id → dispute ids raised against that task.
    by_task: RwLock<HashMap<String, Vec<String>>>,
    /// Task-scoped monotonic sequence for dispute identifiers.
    next_seq: RwLock<HashMap<String, u64>>,
}

impl DisputeManager {
    pub fn new() -> Self {
        Self {
            disputes: RwLock::new(HashMap::new()),
            by_task: RwLock::new(HashMap::new()),
            next_seq: RwLock::new(HashMap::new()),
        }
    }

    // ── Challenge intake ─────────────────────────────────────────────────

    /// Validate a challenge against a committed tree. Pure: no state is
    /// touched and the same inputs always produce the same answer.
    pub fn validate_challenge(
        &self,
        challenge: &ChallengeSubmission,
        tree: &ReasoningTree,
    ) -> Result<()> {
        self.validate_challenge_at(challenge, tree, unix_now())
    }

    pub fn validate_challenge_at(
        &self,
        challenge: &ChallengeSubmission,
        tree: &ReasoningTree,
        now: u64,
    ) -> Result<()> {
        let disputes = self.disputes.read();
        Self::check_challenge(&disputes, challenge, tree, now)
    }

    fn check_challenge(
        disputes: &HashMap<String, Dispute>,
        challenge: &ChallengeSubmission,
        tree: &ReasoningTree,
        now: u64,
    ) -> Result<()> {
        if tree.find_node(&challenge.target_node_id).is_none() {
            return Err(DisputeError::NodeNotFound(challenge.target_node_id.clone()));
        }

        let required = tree.stake * MIN_CHALLENGE_STAKE_RATIO;
        if challenge.stake < required {
            return Err(DisputeError::StakeBelowMinimum { provided: challenge.stake, required });
        }

        // The boundary second is closed: a challenge landing exactly at
        // submission + window is rejected.
        if now >= tree.submitted_at + CHALLENGE_WINDOW_SECS {
            return Err(DisputeError::WindowClosed(challenge.task_id.clone()));
        }

        let duplicate = disputes.values().any(|d| {
            d.task_id == challenge.task_id
                && d.target_node_id == challenge.target_node_id
                && d.is_active()
        });
        if duplicate {
            return Err(DisputeError::DuplicateActiveChallenge {
                task: challenge.task_id.clone(),
                node: challenge.target_node_id.clone(),
            });
        }

        Ok(())
    }

    /// Accept a challenge and open a dispute in `PendingDefense`.
    pub fn open_dispute(
        &self,
        challenge: &ChallengeSubmission,
        tree: &ReasoningTree,
    ) -> Result<String> {
        self.open_dispute_at(challenge, tree, unix_now())
    }

    pub fn open_dispute_at(
        &self,
        challenge: &ChallengeSubmission,
        tree: &ReasoningTree,
        now: u64,
    ) -> Result<String> {
        // Validation and insertion happen under one write lock so two
        // racing challenges cannot both pass the duplicate check.
        let mut disputes = self.disputes.write();
        Self::check_challenge(&disputes, challenge, tree, now)?;

        let seq = {
            let mut next_seq = self.next_seq.write();
            let counter = next_seq.entry(challenge.task_id.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        let dispute_id = format!("{}-d{}", challenge.task_id, seq);

        let dispute = Dispute {
            dispute_id: dispute_id.clone(),
            task_id: challenge.task_id.clone(),
            target_node_id: challenge.target_node_id.clone(),
            proposer: tree.proposer.clone(),
            challenger: challenge.challenger.clone(),
            proposer_stake: tree.stake,
            challenger_stake: challenge.stake,
            attack: challenge.attack,
            challenge_argument: challenge.argument.clone(),
            challenge_evidence: challenge.evidence.clone(),
            defense: None,
            defense_deadline: now + DEFENSE_WINDOW_SECS,
            status: DisputeStatus::PendingDefense,
            verdict: None,
            created_at: now,
            resolved_at: None,
            settlement: None,
        };
        disputes.insert(dispute_id.clone(), dispute);
        self.by_task
            .write()
            .entry(challenge.task_id.clone())
            .or_insert_with(Vec::new)
            .push(dispute_id.clone());

        info!(
            dispute_id = %dispute_id,
            task_id = %challenge.task_id,
            target = %challenge.target_node_id,
            attack = challenge.attack.name(),
            "dispute opened"
        );
        Ok(dispute_id)
    }

    // ── Defense window ───────────────────────────────────────────────────

    /// Record the proposer's defense and move to adjudication.
    pub fn submit_defense(&self, dispute_id: &str, defense: DefenseSubmission) -> Result<()> {
        self.submit_defense_at(dispute_id, defense, unix_now())
    }

    pub fn submit_defense_at(
        &self,
        dispute_id: &str,
        defense: DefenseSubmission,
        now: u64,
    ) -> Result<()> {
        let mut disputes = self.disputes.write();
        let dispute = disputes
            .get_mut(dispute_id)
            .ok_or_else(|| DisputeError::DisputeNotFound(dispute_id.to_string()))?;

        if dispute.status != DisputeStatus::PendingDefense {
            return Err(DisputeError::InvalidState {
                current: dispute.status.name(),
                expected: DisputeStatus::PendingDefense.name(),
            });
        }
        // The deadline second itself is late.
        if now >= dispute.defense_deadline {
            return Err(DisputeError::DeadlineExceeded(dispute_id.to_string()));
        }

        dispute.defense = Some(defense);
        dispute.status = DisputeStatus::PendingAdjudication;
        info!(dispute_id = %dispute_id, "defense recorded, dispute ready for adjudication");
        Ok(())
    }

    /// Auto-resolve every dispute whose defense window lapsed undefended.
    ///
    /// Idempotent: a swept dispute is `Resolved` and never swept again.
    /// Returns the identifiers resolved by this sweep.
    pub fn sweep_expired_defenses(&self) -> Vec<String> {
        self.sweep_expired_defenses_at(unix_now())
    }

    pub fn sweep_expired_defenses_at(&self, now: u64) -> Vec<String> {
        let mut swept = Vec::new();
        let mut disputes = self.disputes.write();
        for dispute in disputes.values_mut() {
            if dispute.status != DisputeStatus::PendingDefense || dispute.defense_deadline >= now {
                continue;
            }
            let settlement = Settlement::no_defense(
                dispute.attack,
                dispute.proposer_stake,
                dispute.challenger_stake,
            );
            dispute.status = DisputeStatus::Resolved;
            dispute.verdict = Some(Verdict::ChallengeUpheld);
            dispute.resolved_at = Some(now);
            dispute.settlement = Some(settlement);
            warn!(
                dispute_id = %dispute.dispute_id,
                challenger_payout = settlement.challenger_payout,
                "defense window expired, dispute auto-resolved for challenger"
            );
            swept.push(dispute.dispute_id.clone());
        }
        swept.sort();
        swept
    }

    // ── Resolution ───────────────────────────────────────────────────────

    /// Apply a final verdict to a dispute awaiting adjudication.
    ///
    /// `confidence` is clamped to [0, 1]. The settlement and reputation
    /// fields are computed once and never change afterwards.
    pub fn resolve(
        &self,
        dispute_id: &str,
        verdict: Verdict,
        confidence: f64,
    ) -> Result<ResolutionSummary> {
        self.resolve_at(dispute_id, verdict, confidence, unix_now())
    }

    pub fn resolve_at(
        &self,
        dispute_id: &str,
        verdict: Verdict,
        confidence: f64,
        now: u64,
    ) -> Result<ResolutionSummary> {
        let mut disputes = self.disputes.write();
        let dispute = disputes
            .get_mut(dispute_id)
            .ok_or_else(|| DisputeError::DisputeNotFound(dispute_id.to_string()))?;

        if dispute.status != DisputeStatus::PendingAdjudication {
            return Err(DisputeError::InvalidState {
                current: dispute.status.name(),
                expected: DisputeStatus::PendingAdjudication.name(),
            });
        }

        let confidence = confidence.clamp(0.0, 1.0);
        let settlement = Settlement::for_verdict(
            verdict,
            confidence,
            dispute.attack,
            dispute.proposer_stake,
            dispute.challenger_stake,
        );
        dispute.status = DisputeStatus::Resolved;
        dispute.verdict = Some(verdict);
        dispute.resolved_at = Some(now);
        dispute.settlement = Some(settlement);

        info!(
            dispute_id = %dispute_id,
            verdict = ?verdict,
            confidence,
            challenger_payout = settlement.challenger_payout,
            proposer_payout = settlement.proposer_payout,
            "dispute resolved"
        );
        Ok(ResolutionSummary {
            dispute_id: dispute_id.to_string(),
            verdict,
            confidence,
            settlement,
            resolved_at: now,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn get_dispute(&self, dispute_id: &str) -> Option<Dispute> {
        self.disputes.read().get(dispute_id).cloned()
    }

    /// Disputes defended and waiting on a verdict.
    pub fn list_pending_adjudication(&self) -> Vec<Dispute> {
        let mut pending: Vec<Dispute> = self
            .disputes
            .read()
            .values()
            .filter(|d| d.status == DisputeStatus::PendingAdjudication)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.dispute_id.cmp(&b.dispute_id));
        pending
    }

    /// Unresolved disputes raised against a task.
    pub fn list_active_for_task(&self, task_id: &str) -> Vec<Dispute> {
        let disputes = self.disputes.read();
        let by_task = self.by_task.read();
        let mut active: Vec<Dispute> = by_task
            .get(task_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| disputes.get(id))
                    .filter(|d| d.is_active())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        active.sort_by(|a, b| a.dispute_id.cmp(&b.dispute_id));
        active
    }

    pub fn dispute_count(&self) -> usize {
        self.disputes.read().len()
    }
}

impl Default for DisputeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribunal_core::{AttackKind, DefenseKind, NodeKind, ReasoningNode};

    const T0: u64 = 1_700_000_000;

    fn tree() -> ReasoningTree {
        let root = ReasoningNode::new("n0", "carbon pricing works", NodeKind::Conclusion)
            .with_children(vec!["n1".into(), "n2".into()]);
        ReasoningTree {
            task_id: "task-7".into(),
            root,
            nodes: vec![
                ReasoningNode::new("n1", "emissions fell in priced markets", NodeKind::Premise),
                ReasoningNode::new("n2", "price signals shift investment", NodeKind::Premise),
            ],
            merkle_root: "deadbeef".into(),
            stake: 100.0,
            proposer: "proposer-hk".into(),
            submitted_at: T0,
        }
    }

    fn challenge(target: &str, stake: f64) -> ChallengeSubmission {
        ChallengeSubmission {
            task_id: "task-7".into(),
            target_node_id: target.into(),
            attack: AttackKind::FactualError,
            argument: "the cited market saw emissions rise".into(),
            evidence: None,
            stake,
            challenger: "challenger-hk".into(),
        }
    }

    fn defense() -> DefenseSubmission {
        DefenseSubmission {
            kind: DefenseKind::Refute,
            argument: "figures include out-of-scheme sectors".into(),
            evidence: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        let mgr = DisputeManager::new();
        assert!(mgr.validate_challenge_at(&challenge("n1", 20.0), &tree(), T0 + 60).is_ok());
    }

    #[test]
    fn test_validate_unknown_node() {
        let mgr = DisputeManager::new();
        let err = mgr.validate_challenge_at(&challenge("n9", 20.0), &tree(), T0 + 60);
        assert!(matches!(err, Err(DisputeError::NodeNotFound(id)) if id == "n9"));
    }

    #[test]
    fn test_validate_stake_floor_is_ten_percent() {
        let mgr = DisputeManager::new();
        let err = mgr.validate_challenge_at(&challenge("n1", 9.99), &tree(), T0 + 60);
        assert!(matches!(err, Err(DisputeError::StakeBelowMinimum { required, .. }) if required == 10.0));
        // Exactly 10% passes.
        assert!(mgr.validate_challenge_at(&challenge("n1", 10.0), &tree(), T0 + 60).is_ok());
    }

    #[test]
    fn test_challenge_window_boundary() {
        let mgr = DisputeManager::new();
        let window = CHALLENGE_WINDOW_SECS;
        // One second inside the window: accepted.
        assert!(mgr.validate_challenge_at(&challenge("n1", 20.0), &tree(), T0 + window - 1).is_ok());
        // The boundary second itself: rejected.
        let err = mgr.validate_challenge_at(&challenge("n1", 20.0), &tree(), T0 + window);
        assert!(matches!(err, Err(DisputeError::WindowClosed(_))));
    }

    #[test]
    fn test_duplicate_active_challenge() {
        let mgr = DisputeManager::new();
        mgr.open_dispute_at(&challenge("n1", 20.0), &tree(), T0 + 60).unwrap();
        let err = mgr.validate_challenge_at(&challenge("n1", 25.0), &tree(), T0 + 120);
        assert!(matches!(err, Err(DisputeError::DuplicateActiveChallenge { .. })));
        // A different node of the same task is fine.
        assert!(mgr.validate_challenge_at(&challenge("n2", 25.0), &tree(), T0 + 120).is_ok());
    }

    #[test]
    fn test_challenge_allowed_after_resolution() {
        let mgr = DisputeManager::new();
        let id = mgr.open_dispute_at(&challenge("n1", 20.0), &tree(), T0 + 60).unwrap();
        mgr.submit_defense_at(&id, defense(), T0 + 120).unwrap();
        mgr.resolve_at(&id, Verdict::ChallengeRejected, 0.9, T0 + 600).unwrap();
        // The prior dispute is resolved, so the target is contestable again.
        assert!(mgr.validate_challenge_at(&challenge("n1", 25.0), &tree(), T0 + 900).is_ok());
    }

    #[test]
    fn test_open_dispute_ids_are_task_scoped_monotonic() {
        let mgr = DisputeManager::new();
        let a = mgr.open_dispute_at(&challenge("n1", 20.0), &tree(), T0 + 60).unwrap();
        let b = mgr.open_dispute_at(&challenge("n2", 20.0), &tree(), T0 + 61).unwrap();
        assert_eq!(a, "task-7-d1");
        assert_eq!(b, "task-7-d2");

        let d = mgr.get_dispute(&a).unwrap();
        assert_eq!(d.status, DisputeStatus::PendingDefense);
        assert_eq!(d.defense_deadline, T0 + 60 + DEFENSE_WINDOW_SECS);
        assert_eq!(d.proposer_stake, 100.0);
    }

    #[test]
    fn test_defense_window_boundary() {
        let mgr = DisputeManager::new();
        let opened_at = T0 + 60;
        let id = mgr.open_dispute_at(&challenge("n1", 20.0), &tree(), opened_at).unwrap();
        let deadline = opened_at + DEFENSE_WINDOW_SECS;

        // The deadline second itself is late.
        let err = mgr.submit_defense_at(&id, defense(), deadline);
        assert!(matches!(err, Err(DisputeError::DeadlineExceeded(_))));

        // One second earlier is in time.
        assert!(mgr.submit_defense_at(&id, defense(), deadline - 1).is_ok());
        assert_eq!(mgr.get_dispute(&id).unwrap().status, DisputeStatus::PendingAdjudication);
    }

    #[test]
    fn test_defense_wrong_state() {
        let mgr = DisputeManager::new();
        let id = mgr.open_dispute_at(&challenge("n1", 20.0), &tree(), T0 + 60).unwrap();
        mgr.submit_defense_at(&id, defense(), T0 + 120).unwrap();
        let err = mgr.submit_defense_at(&id, defense(), T0 + 180);
        assert!(matches!(err, Err(DisputeError::InvalidState { .. })));
    }

    #[test]
    fn test_defense_unknown_dispute() {
        let mgr = DisputeManager::new();
        let err = mgr.submit_defense_at("task-7-d9", defense(), T0);
        assert!(matches!(err, Err(DisputeError::DisputeNotFound(_))));
    }

    #[test]
    fn test_sweep_auto_resolves_for_challenger() {
        let mgr = DisputeManager::new();
        let opened_at = T0 + 60;
        let mut c = challenge("n1", 30.0);
        c.attack = AttackKind::LogicalFallacy;
        let id = mgr.open_dispute_at(&c, &tree(), opened_at).unwrap();
        let deadline = opened_at + DEFENSE_WINDOW_SECS;

        // At the deadline the dispute is still sweep-exempt.
        assert!(mgr.sweep_expired_defenses_at(deadline).is_empty());

        // One second past the deadline it resolves for the challenger.
        let swept = mgr.sweep_expired_defenses_at(deadline + 1);
        assert_eq!(swept, vec![id.clone()]);

        let d = mgr.get_dispute(&id).unwrap();
        assert_eq!(d.status, DisputeStatus::Resolved);
        assert_eq!(d.verdict, Some(Verdict::ChallengeUpheld));
        let s = d.settlement.unwrap();
        // 30*2.5 + min(100, 45) = 120
        assert!((s.challenger_payout - 120.0).abs() <= 1e-9);
        assert!((s.proposer_payout + 45.0).abs() <= 1e-9);
        assert!((s.proposer_reputation_delta + 0.15).abs() <= 1e-9);
        assert!((s.challenger_reputation_delta - 0.05).abs() <= 1e-9);

        // The sweep is idempotent.
        assert!(mgr.sweep_expired_defenses_at(deadline + 2).is_empty());
    }

    #[test]
    fn test_resolve_requires_pending_adjudication() {
        let mgr = DisputeManager::new();
        let id = mgr.open_dispute_at(&challenge("n1", 20.0), &tree(), T0 + 60).unwrap();
        let err = mgr.resolve_at(&id, Verdict::ChallengeUpheld, 1.0, T0 + 120);
        assert!(matches!(err, Err(DisputeError::InvalidState { .. })));
    }

    #[test]
    fn test_resolve_settles_and_freezes() {
        let mgr = DisputeManager::new();
        let mut c = challenge("n1", 20.0);
        c.attack = AttackKind::Contradiction;
        let id = mgr.open_dispute_at(&c, &tree(), T0 + 60).unwrap();
        mgr.submit_defense_at(&id, defense(), T0 + 120).unwrap();

        let summary = mgr.resolve_at(&id, Verdict::ChallengeUpheld, 1.0, T0 + 600).unwrap();
        assert!((summary.settlement.challenger_payout - 90.0).abs() <= 1e-9);
        assert!((summary.settlement.proposer_payout + 30.0).abs() <= 1e-9);

        // A second resolve is rejected and the settlement is unchanged.
        let err = mgr.resolve_at(&id, Verdict::ChallengeRejected, 0.5, T0 + 700);
        assert!(matches!(err, Err(DisputeError::InvalidState { .. })));
        let d = mgr.get_dispute(&id).unwrap();
        assert_eq!(d.settlement.unwrap(), summary.settlement);
    }

    #[test]
    fn test_resolve_clamps_confidence() {
        let mgr = DisputeManager::new();
        let id = mgr.open_dispute_at(&challenge("n1", 20.0), &tree(), T0 + 60).unwrap();
        mgr.submit_defense_at(&id, defense(), T0 + 120).unwrap();
        let summary = mgr.resolve_at(&id, Verdict::ChallengeUpheld, 1.7, T0 + 600).unwrap();
        assert_eq!(summary.confidence, 1.0);
    }

    #[test]
    fn test_queries() {
        let mgr = DisputeManager::new();
        let a = mgr.open_dispute_at(&challenge("n1", 20.0), &tree(), T0 + 60).unwrap();
        let b = mgr.open_dispute_at(&challenge("n2", 20.0), &tree(), T0 + 61).unwrap();
        mgr.submit_defense_at(&a, defense(), T0 + 120).unwrap();

        let pending = mgr.list_pending_adjudication();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].dispute_id, a);

        let active = mgr.list_active_for_task("task-7");
        assert_eq!(active.len(), 2);

        mgr.resolve_at(&a, Verdict::Partial, 0.8, T0 + 600).unwrap();
        assert_eq!(mgr.list_active_for_task("task-7").len(), 1);
        assert_eq!(mgr.list_active_for_task("task-7")[0].dispute_id, b);
        assert_eq!(mgr.dispute_count(), 2);
        assert!(mgr.list_active_for_task("other-task").is_empty());
    }
}
