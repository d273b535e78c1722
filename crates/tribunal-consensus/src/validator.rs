use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::tier::ValidatorTier;

/// Calibration scores clamp to this range.
pub const CALIBRATION_MIN: f64 = 0.3;
pub const CALIBRATION_MAX: f64 = 1.5;
/// Score assigned at registration.
pub const INITIAL_CALIBRATION: f64 = 1.0;
/// Exponential memory of the calibration mean, in days.
pub const CALIBRATION_MEMORY_DAYS: f64 = 30.0;
/// Contribution factor applied to misaligned verdicts.
pub const INCORRECT_CONTRIBUTION_FACTOR: f64 = 0.5;
/// Most recent verdict outcomes retained per validator.
pub const MAX_VERDICT_HISTORY: usize = 100;

/// One resolved verdict in a validator's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub timestamp: u64,
    pub correct: bool,
    pub confidence: f64,
    /// How well the vote's confidence aligned with the outcome.
    pub alignment: f64,
}

/// Registered validator state. Owned exclusively by the consensus engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorState {
    pub hotkey: String,
    pub tier: ValidatorTier,
    pub stake: f64,
    /// Time-decayed accuracy-by-confidence score, clamped to
    /// [`CALIBRATION_MIN`]..=[`CALIBRATION_MAX`].
    pub calibration: f64,
    pub total_verdicts: u64,
    pub correct_verdicts: u64,
    pub cases_this_epoch: u32,
    pub last_active: u64,
    /// When the validator entered its current tier.
    pub tier_since: u64,
    /// Timestamps of slashing events reported against this validator.
    pub slash_events: Vec<u64>,
    /// Instant up to which inactivity decay has been charged.
    pub decayed_through: u64,
    /// Bounded record of recent verdict outcomes, oldest first.
    pub history: VecDeque<VerdictRecord>,
}

impl ValidatorState {
    pub fn new(hotkey: impl Into<String>, stake: f64, tier: ValidatorTier, now: u64) -> Self {
        Self {
            hotkey: hotkey.into(),
            tier,
            stake,
            calibration: INITIAL_CALIBRATION,
            total_verdicts: 0,
            correct_verdicts: 0,
            cases_this_epoch: 0,
            last_active: now,
            tier_since: now,
            slash_events: Vec::new(),
            decayed_through: now,
            history: VecDeque::new(),
        }
    }

    /// Voting weight: stake scaled by calibration and tier.
    ///
    /// Monotone in stake and calibration; strictly positive exactly when
    /// both are.
    pub fn effective_weight(&self) -> f64 {
        self.stake * self.calibration * self.tier.weight_multiplier()
    }

    /// Whether this validator can take another case this epoch.
    pub fn has_quota(&self) -> bool {
        match self.tier.epoch_case_cap() {
            Some(cap) => self.cases_this_epoch < cap,
            None => true,
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.total_verdicts == 0 {
            0.0
        } else {
            self.correct_verdicts as f64 / self.total_verdicts as f64
        }
    }

    /// Append a resolved verdict outcome and recompute calibration.
    ///
    /// Calibration is a time-decayed weighted mean over the retained
    /// history: each entry weighs `exp(-age_days / 30)` and contributes
    /// its alignment, halved when the verdict was wrong. The result
    /// clamps to [0.3, 1.5].
    pub fn record_verdict(&mut self, now: u64, correct: bool, confidence: f64, alignment: f64) {
        self.total_verdicts += 1;
        if correct {
            self.correct_verdicts += 1;
        }
        if self.history.len() == MAX_VERDICT_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(VerdictRecord { timestamp: now, correct, confidence, alignment });
        self.recompute_calibration(now);
    }

    fn recompute_calibration(&mut self, now: u64) {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for record in &self.history {
            let age_days = now.saturating_sub(record.timestamp) as f64 / 86_400.0;
            let weight = (-age_days / CALIBRATION_MEMORY_DAYS).exp();
            let contribution = if record.correct {
                record.alignment
            } else {
                record.alignment * INCORRECT_CONTRIBUTION_FACTOR
            };
            weighted_sum += contribution * weight;
            weight_total += weight;
        }
        if weight_total > 0.0 {
            self.calibration = (weighted_sum / weight_total).clamp(CALIBRATION_MIN, CALIBRATION_MAX);
        }
    }

    /// Whether any slashing event landed within `window_days` before `now`.
    pub fn slashed_within(&self, now: u64, window_days: u64) -> bool {
        let window = window_days * 86_400;
        self.slash_events.iter().any(|t| now.saturating_sub(*t) < window)
    }

    pub fn stats(&self) -> ValidatorStats {
        ValidatorStats {
            hotkey: self.hotkey.clone(),
            tier: self.tier,
            stake: self.stake,
            calibration: self.calibration,
            total_verdicts: self.total_verdicts,
            correct_verdicts: self.correct_verdicts,
            accuracy: self.accuracy(),
            cases_this_epoch: self.cases_this_epoch,
            effective_weight: self.effective_weight(),
        }
    }
}

/// Read-model snapshot of a validator, for collaborators and operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorStats {
    pub hotkey: String,
    pub tier: ValidatorTier,
    pub stake: f64,
    pub calibration: f64,
    pub total_verdicts: u64,
    pub correct_verdicts: u64,
    pub accuracy: f64,
    pub cases_this_epoch: u32,
    pub effective_weight: f64,
}
