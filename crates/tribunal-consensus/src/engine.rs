use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use tribunal_core::constants::{ADJUDICATION_WINDOW_SECS, ESCALATION_EXTENSION_SECS};
use tribunal_core::{days_between, unix_now, Verdict};

use crate::error::{ConsensusError, Result};
use crate::tally::{ConsensusResult, VerdictWeights, Vote};
use crate::tier::{ValidatorTier, SCOUT_MIN_STAKE};
use crate::validator::{ValidatorState, ValidatorStats};

/// Validators below this calibration score are never assigned.
pub const MIN_ASSIGNMENT_CALIBRATION: f64 = 0.5;

/// Calibration lost per full week of inactivity beyond the grace week.
pub const INACTIVITY_DECAY_PER_WEEK: f64 = 0.02;

/// Inactivity decay never pushes calibration below this.
pub const INACTIVITY_DECAY_FLOOR: f64 = 0.5;

/// An in-flight adjudication: the panel, its votes and its deadline.
///
/// References the dispute by identifier only; the dispute manager keeps
/// ownership of the dispute itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjudication {
    pub dispute_id: String,
    pub panel: Vec<String>,
    pub votes: Vec<Vote>,
    pub deadline: u64,
    pub escalated: bool,
}

/// Weighted-consensus engine over the validator registry.
///
/// Owns validator state, vote sets and in-flight adjudication records.
/// Writes are serialized through the internal locks; statistics reads
/// take read locks only.
pub struct ConsensusEngine {
    /// LOCK ORDER: validators → adjudications (consistent everywhere)
    validators: RwLock<HashMap<String, ValidatorState>>,
    adjudications: RwLock<HashMap<String, Adjudication>>,
    /// Seeded panel-selection RNG. The seed source (e.g. a recent block
    /// hash) is the caller's concern; given the seed, selection is
    /// reproducible.
    rng: Mutex<StdRng>,
    epoch: RwLock<u64>,
}

impl ConsensusEngine {
    /// Engine with an entropy-seeded RNG, for production use.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Engine with a fixed selection seed, for auditable assignment.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            validators: RwLock::new(HashMap::new()),
            adjudications: RwLock::new(HashMap::new()),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            epoch: RwLock::new(0),
        }
    }

    // ── Registry ─────────────────────────────────────────────────────────

    /// Register a validator at the requested tier.
    ///
    /// A stake too small for the requested tier demotes the registration
    /// to the highest tier the stake permits; below the scout minimum
    /// the registration fails.
    pub fn register(
        &self,
        hotkey: &str,
        stake: f64,
        requested: ValidatorTier,
    ) -> Result<ValidatorState> {
        self.register_at(hotkey, stake, requested, unix_now())
    }

    pub fn register_at(
        &self,
        hotkey: &str,
        stake: f64,
        requested: ValidatorTier,
        now: u64,
    ) -> Result<ValidatorState> {
        let mut validators = self.validators.write();
        if validators.contains_key(hotkey) {
            return Err(ConsensusError::ValidatorAlreadyRegistered(hotkey.to_string()));
        }
        let permitted = ValidatorTier::from_stake(stake).ok_or(ConsensusError::StakeBelowTier {
            provided: stake,
            required: SCOUT_MIN_STAKE,
        })?;
        let tier = requested.min(permitted);
        if tier != requested {
            debug!(
                hotkey,
                requested = requested.name(),
                granted = tier.name(),
                "stake below requested tier, demoting registration"
            );
        }
        let state = ValidatorState::new(hotkey, stake, tier, now);
        validators.insert(hotkey.to_string(), state.clone());
        info!(hotkey, tier = tier.name(), stake, "validator registered");
        Ok(state)
    }

    /// Drop a validator from the registry, returning its final state.
    pub fn deregister(&self, hotkey: &str) -> Option<ValidatorState> {
        let removed = self.validators.write().remove(hotkey);
        if removed.is_some() {
            info!(hotkey, "validator deregistered");
        }
        removed
    }

    /// Record an externally reported slashing event against a validator.
    pub fn record_slash(&self, hotkey: &str) -> Result<()> {
        self.record_slash_at(hotkey, unix_now())
    }

    pub fn record_slash_at(&self, hotkey: &str, now: u64) -> Result<()> {
        let mut validators = self.validators.write();
        let state = validators
            .get_mut(hotkey)
            .ok_or_else(|| ConsensusError::UnknownValidator(hotkey.to_string()))?;
        state.slash_events.push(now);
        warn!(hotkey, "slashing event recorded");
        Ok(())
    }

    // ── Assignment ───────────────────────────────────────────────────────

    /// Assign `k` validators to adjudicate a dispute.
    ///
    /// Selection is weight-proportional sampling without replacement over
    /// the eligible pool (epoch quota remaining, calibration at least
    /// [`MIN_ASSIGNMENT_CALIBRATION`]). Each pick removes the validator
    /// from the pool and charges its epoch quota.
    pub fn assign(&self, dispute_id: &str, k: usize) -> Result<Vec<String>> {
        self.assign_at(dispute_id, k, unix_now())
    }

    pub fn assign_at(&self, dispute_id: &str, k: usize, now: u64) -> Result<Vec<String>> {
        let mut validators = self.validators.write();
        let mut adjudications = self.adjudications.write();
        if adjudications.contains_key(dispute_id) {
            return Err(ConsensusError::DisputeAlreadyAssigned(dispute_id.to_string()));
        }

        // Sorted pool so a fixed seed yields a fixed panel regardless of
        // map iteration order.
        let mut pool: Vec<(String, f64)> = validators
            .values()
            .filter(|v| v.has_quota() && v.calibration >= MIN_ASSIGNMENT_CALIBRATION)
            .map(|v| (v.hotkey.clone(), v.effective_weight()))
            .collect();
        pool.sort_by(|a, b| a.0.cmp(&b.0));
        if pool.is_empty() {
            return Err(ConsensusError::NoEligibleValidators);
        }

        let picks = k.min(pool.len());
        let mut panel = Vec::with_capacity(picks);
        let mut rng = self.rng.lock();
        for _ in 0..picks {
            let total: f64 = pool.iter().map(|(_, w)| w).sum();
            if total <= 0.0 {
                break;
            }
            let draw = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            let mut chosen = pool.len() - 1;
            for (index, (_, weight)) in pool.iter().enumerate() {
                acc += weight;
                if draw < acc {
                    chosen = index;
                    break;
                }
            }
            let (hotkey, _) = pool.remove(chosen);
            panel.push(hotkey);
        }

        for hotkey in &panel {
            if let Some(v) = validators.get_mut(hotkey) {
                v.cases_this_epoch += 1;
            }
        }
        adjudications.insert(
            dispute_id.to_string(),
            Adjudication {
                dispute_id: dispute_id.to_string(),
                panel: panel.clone(),
                votes: Vec::new(),
                deadline: now + ADJUDICATION_WINDOW_SECS,
                escalated: false,
            },
        );
        info!(dispute_id, panel_size = panel.len(), "validators assigned to dispute");
        Ok(panel)
    }

    // ── Voting ───────────────────────────────────────────────────────────

    /// Accept a vote from an assigned validator.
    pub fn submit_vote(
        &self,
        dispute_id: &str,
        voter: &str,
        verdict: Verdict,
        confidence: f64,
        reasoning: &str,
    ) -> Result<()> {
        self.submit_vote_at(dispute_id, voter, verdict, confidence, reasoning, unix_now())
    }

    pub fn submit_vote_at(
        &self,
        dispute_id: &str,
        voter: &str,
        verdict: Verdict,
        confidence: f64,
        reasoning: &str,
        now: u64,
    ) -> Result<()> {
        let mut validators = self.validators.write();
        let mut adjudications = self.adjudications.write();
        let adjudication = adjudications
            .get_mut(dispute_id)
            .ok_or_else(|| ConsensusError::DisputeNotFound(dispute_id.to_string()))?;

        if !adjudication.panel.iter().any(|hk| hk == voter) {
            return Err(ConsensusError::NotAssigned {
                dispute: dispute_id.to_string(),
                voter: voter.to_string(),
            });
        }
        if now > adjudication.deadline {
            return Err(ConsensusError::DeadlineExceeded(dispute_id.to_string()));
        }
        if adjudication.votes.iter().any(|v| v.voter == voter) {
            return Err(ConsensusError::AlreadyVoted {
                dispute: dispute_id.to_string(),
                voter: voter.to_string(),
            });
        }

        adjudication.votes.push(Vote {
            voter: voter.to_string(),
            verdict,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.to_string(),
            submitted_at: now,
        });
        if let Some(state) = validators.get_mut(voter) {
            state.last_active = now;
        }
        debug!(dispute_id, voter, verdict = ?verdict, "vote recorded");
        Ok(())
    }

    // ── Tally and finalization ───────────────────────────────────────────

    /// Weighted tally of the votes cast so far.
    pub fn tally(&self, dispute_id: &str) -> Result<ConsensusResult> {
        let validators = self.validators.read();
        let adjudications = self.adjudications.read();
        let adjudication = adjudications
            .get(dispute_id)
            .ok_or_else(|| ConsensusError::DisputeNotFound(dispute_id.to_string()))?;
        Ok(Self::tally_record(&validators, adjudication))
    }

    /// Each vote weighs its voter's effective weight scaled by the vote
    /// confidence. A vote whose voter has vanished from the registry is
    /// skipped, not fatal: one corrupt record must not stall adjudication.
    fn tally_record(
        validators: &HashMap<String, ValidatorState>,
        adjudication: &Adjudication,
    ) -> ConsensusResult {
        let mut raw = VerdictWeights::default();
        for vote in &adjudication.votes {
            match validators.get(&vote.voter) {
                Some(state) => raw.add(vote.verdict, state.effective_weight() * vote.confidence),
                None => {
                    warn!(
                        dispute_id = %adjudication.dispute_id,
                        voter = %vote.voter,
                        "vote from unknown validator, skipping"
                    );
                }
            }
        }
        ConsensusResult::from_weights(
            adjudication.dispute_id.clone(),
            raw,
            adjudication.panel.clone(),
            adjudication.escalated,
        )
    }

    /// Close out an adjudication.
    ///
    /// Without consensus on a never-escalated dispute this triggers
    /// escalation and returns the post-escalation tally. Otherwise the
    /// result stands: every voter's calibration absorbs the outcome and
    /// the in-flight record is cleared.
    pub fn finalize(&self, dispute_id: &str) -> Result<ConsensusResult> {
        self.finalize_at(dispute_id, unix_now())
    }

    pub fn finalize_at(&self, dispute_id: &str, now: u64) -> Result<ConsensusResult> {
        let mut validators = self.validators.write();
        let mut adjudications = self.adjudications.write();
        let adjudication = adjudications
            .get_mut(dispute_id)
            .ok_or_else(|| ConsensusError::DisputeNotFound(dispute_id.to_string()))?;

        let result = Self::tally_record(&validators, adjudication);
        if !result.consensus_reached && !adjudication.escalated {
            return Ok(Self::escalate_record(&mut validators, adjudication));
        }

        let votes = adjudication.votes.clone();
        for vote in &votes {
            let Some(state) = validators.get_mut(&vote.voter) else {
                warn!(dispute_id, voter = %vote.voter, "skipping calibration for unknown voter");
                continue;
            };
            let correct = vote.verdict == result.final_verdict;
            let alignment =
                if correct { 1.0 - (1.0 - vote.confidence).abs() } else { 1.0 - vote.confidence };
            state.record_verdict(now, correct, vote.confidence, alignment);
            Self::apply_tier_floor(state, now);
        }
        adjudications.remove(dispute_id);
        info!(
            dispute_id,
            verdict = ?result.final_verdict,
            share = result.winning_weight,
            "adjudication finalized"
        );
        Ok(result)
    }

    /// Escalate an undecided dispute to the arbiter tier.
    pub fn escalate(&self, dispute_id: &str) -> Result<ConsensusResult> {
        let mut validators = self.validators.write();
        let mut adjudications = self.adjudications.write();
        let adjudication = adjudications
            .get_mut(dispute_id)
            .ok_or_else(|| ConsensusError::DisputeNotFound(dispute_id.to_string()))?;
        Ok(Self::escalate_record(&mut validators, adjudication))
    }

    /// Escalation happens at most once: the panel becomes every arbiter
    /// with quota, the deadline stretches, and only votes already cast by
    /// panel arbiters survive. With no arbiters available the current
    /// result is returned, flagged escalated.
    fn escalate_record(
        validators: &mut HashMap<String, ValidatorState>,
        adjudication: &mut Adjudication,
    ) -> ConsensusResult {
        if adjudication.escalated {
            return Self::tally_record(validators, adjudication);
        }

        let mut arbiters: Vec<String> = validators
            .values()
            .filter(|v| v.tier == ValidatorTier::Arbiter && v.has_quota())
            .map(|v| v.hotkey.clone())
            .collect();
        arbiters.sort();

        adjudication.escalated = true;
        if arbiters.is_empty() {
            warn!(
                dispute_id = %adjudication.dispute_id,
                "no arbiters available for escalation"
            );
            return Self::tally_record(validators, adjudication);
        }

        for hotkey in &arbiters {
            if !adjudication.panel.iter().any(|hk| hk == hotkey) {
                if let Some(state) = validators.get_mut(hotkey) {
                    state.cases_this_epoch += 1;
                }
            }
        }
        adjudication.votes.retain(|v| arbiters.iter().any(|hk| hk == &v.voter));
        adjudication.panel = arbiters;
        adjudication.deadline += ESCALATION_EXTENSION_SECS;
        info!(
            dispute_id = %adjudication.dispute_id,
            panel_size = adjudication.panel.len(),
            deadline = adjudication.deadline,
            "dispute escalated to arbiter panel"
        );
        Self::tally_record(validators, adjudication)
    }

    // ── Calibration feedback ─────────────────────────────────────────────

    /// Feed a resolved verdict outcome into a validator's calibration.
    ///
    /// Alignment is `1 - |1 - confidence|` on a matching verdict and
    /// `1 - confidence` otherwise, then folded into the time-decayed
    /// calibration mean. A score under the tier floor demotes one tier.
    pub fn update_calibration(&self, hotkey: &str, correct: bool, confidence: f64) -> Result<f64> {
        self.update_calibration_at(hotkey, correct, confidence, unix_now())
    }

    pub fn update_calibration_at(
        &self,
        hotkey: &str,
        correct: bool,
        confidence: f64,
        now: u64,
    ) -> Result<f64> {
        let mut validators = self.validators.write();
        let state = validators
            .get_mut(hotkey)
            .ok_or_else(|| ConsensusError::UnknownValidator(hotkey.to_string()))?;
        let confidence = confidence.clamp(0.0, 1.0);
        let alignment = if correct { 1.0 - (1.0 - confidence).abs() } else { 1.0 - confidence };
        state.record_verdict(now, correct, confidence, alignment);
        Self::apply_tier_floor(state, now);
        Ok(state.calibration)
    }

    fn apply_tier_floor(state: &mut ValidatorState, now: u64) {
        if let Some(lower) = state.tier.demoted() {
            if state.calibration < state.tier.calibration_floor() {
                warn!(
                    hotkey = %state.hotkey,
                    calibration = state.calibration,
                    from = state.tier.name(),
                    to = lower.name(),
                    "calibration under tier floor, demoting"
                );
                state.tier = lower;
                state.tier_since = now;
            }
        }
    }

    /// Charge calibration decay for inactivity: 0.02 per full inactive
    /// week, floored at 0.5.
    ///
    /// Idempotent: each validator remembers the instant decay was last
    /// charged through, so repeating the sweep at one instant changes
    /// nothing and staggered sweeps never double-charge a week.
    pub fn decay_sweep(&self) {
        self.decay_sweep_at(unix_now())
    }

    pub fn decay_sweep_at(&self, now: u64) {
        let mut validators = self.validators.write();
        let mut decayed = 0usize;
        for state in validators.values_mut() {
            let weeks_total = days_between(state.last_active, now) / 7;
            let weeks_charged = if state.decayed_through > state.last_active {
                days_between(state.last_active, state.decayed_through) / 7
            } else {
                0
            };
            state.decayed_through = now;
            let weeks_due = weeks_total.saturating_sub(weeks_charged);
            if weeks_due == 0 || state.calibration <= INACTIVITY_DECAY_FLOOR {
                continue;
            }
            let penalty = INACTIVITY_DECAY_PER_WEEK * weeks_due as f64;
            state.calibration = (state.calibration - penalty).max(INACTIVITY_DECAY_FLOOR);
            decayed += 1;
        }
        if decayed > 0 {
            info!(decayed, "inactivity decay applied");
        }
    }

    /// Roll the epoch: every per-epoch case counter resets.
    pub fn new_epoch(&self) -> u64 {
        let mut epoch = self.epoch.write();
        *epoch += 1;
        for state in self.validators.write().values_mut() {
            state.cases_this_epoch = 0;
        }
        info!(epoch = *epoch, "epoch rolled, case counters reset");
        *epoch
    }

    pub fn current_epoch(&self) -> u64 {
        *self.epoch.read()
    }

    // ── Promotion ────────────────────────────────────────────────────────

    /// Promote a validator one tier if it meets the cumulative bar.
    pub fn promote(&self, hotkey: &str) -> Result<ValidatorTier> {
        self.promote_at(hotkey, unix_now())
    }

    pub fn promote_at(&self, hotkey: &str, now: u64) -> Result<ValidatorTier> {
        let mut validators = self.validators.write();
        let state = validators
            .get_mut(hotkey)
            .ok_or_else(|| ConsensusError::UnknownValidator(hotkey.to_string()))?;

        let ineligible = |reason: &str| ConsensusError::PromotionIneligible {
            hotkey: hotkey.to_string(),
            reason: reason.to_string(),
        };
        let requirements =
            state.tier.promotion_requirements().ok_or_else(|| ineligible("already at top tier"))?;

        if days_between(state.tier_since, now) < requirements.min_days_in_tier {
            return Err(ineligible("insufficient time in tier"));
        }
        if state.calibration < requirements.min_calibration {
            return Err(ineligible("calibration below bar"));
        }
        if state.total_verdicts < requirements.min_verdicts {
            return Err(ineligible("insufficient verdict count"));
        }
        if state.stake < requirements.min_stake {
            return Err(ineligible("stake below next tier minimum"));
        }
        if let Some(window_days) = requirements.slash_free_days {
            if state.slashed_within(now, window_days) {
                return Err(ineligible("slashed within the probation window"));
            }
        }

        // promotion_requirements() returning Some guarantees an upper tier.
        let next = state.tier.promoted().ok_or_else(|| ineligible("already at top tier"))?;
        info!(hotkey, from = state.tier.name(), to = next.name(), "validator promoted");
        state.tier = next;
        state.tier_since = now;
        Ok(next)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn stats(&self, hotkey: &str) -> Result<ValidatorStats> {
        self.validators
            .read()
            .get(hotkey)
            .map(ValidatorState::stats)
            .ok_or_else(|| ConsensusError::UnknownValidator(hotkey.to_string()))
    }

    pub fn get_validator(&self, hotkey: &str) -> Option<ValidatorState> {
        self.validators.read().get(hotkey).cloned()
    }

    pub fn get_adjudication(&self, dispute_id: &str) -> Option<Adjudication> {
        self.adjudications.read().get(dispute_id).cloned()
    }

    pub fn validator_count(&self) -> usize {
        self.validators.read().len()
    }
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new()
    }
}
