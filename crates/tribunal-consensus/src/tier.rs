// Validator tier system: scouts, auditors, arbiters.
// Tier gates case capacity, vote weight and eligibility for escalated panels.

use serde::{Deserialize, Serialize};

/// Minimum stake to register as a scout.
pub const SCOUT_MIN_STAKE: f64 = 100.0;
/// Minimum stake to register as an auditor.
pub const AUDITOR_MIN_STAKE: f64 = 500.0;
/// Minimum stake to register as an arbiter.
pub const ARBITER_MIN_STAKE: f64 = 2_000.0;

/// Validator tier levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorTier {
    /// Entry tier: light caseload, baseline weight.
    Scout,
    /// Mid tier: larger caseload, double weight.
    Auditor,
    /// Top tier: unbounded caseload, 5x weight, staffs escalated panels.
    Arbiter,
}

/// Cumulative requirements for moving up one tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromotionRequirements {
    pub min_days_in_tier: u64,
    pub min_calibration: f64,
    pub min_verdicts: u64,
    pub min_stake: f64,
    /// Days the validator must have been slash-free, when required.
    pub slash_free_days: Option<u64>,
}

impl ValidatorTier {
    /// Minimum stake for this tier.
    pub fn min_stake(&self) -> f64 {
        match self {
            ValidatorTier::Scout => SCOUT_MIN_STAKE,
            ValidatorTier::Auditor => AUDITOR_MIN_STAKE,
            ValidatorTier::Arbiter => ARBITER_MIN_STAKE,
        }
    }

    /// Highest tier the given stake can hold, if any.
    pub fn from_stake(stake: f64) -> Option<Self> {
        if stake >= ARBITER_MIN_STAKE {
            Some(ValidatorTier::Arbiter)
        } else if stake >= AUDITOR_MIN_STAKE {
            Some(ValidatorTier::Auditor)
        } else if stake >= SCOUT_MIN_STAKE {
            Some(ValidatorTier::Scout)
        } else {
            None
        }
    }

    /// Vote weight multiplier for this tier.
    pub fn weight_multiplier(&self) -> f64 {
        match self {
            ValidatorTier::Scout => 1.0,
            ValidatorTier::Auditor => 2.0,
            ValidatorTier::Arbiter => 5.0,
        }
    }

    /// Cases a validator of this tier may take per epoch.
    /// `None` means unbounded.
    pub fn epoch_case_cap(&self) -> Option<u32> {
        match self {
            ValidatorTier::Scout => Some(10),
            ValidatorTier::Auditor => Some(50),
            ValidatorTier::Arbiter => None,
        }
    }

    /// Calibration score below which a validator drops out of this tier.
    pub fn calibration_floor(&self) -> f64 {
        match self {
            ValidatorTier::Scout => 0.5,
            ValidatorTier::Auditor => 0.7,
            ValidatorTier::Arbiter => 0.85,
        }
    }

    /// The tier one step down, if any.
    pub fn demoted(&self) -> Option<Self> {
        match self {
            ValidatorTier::Scout => None,
            ValidatorTier::Auditor => Some(ValidatorTier::Scout),
            ValidatorTier::Arbiter => Some(ValidatorTier::Auditor),
        }
    }

    /// The tier one step up, if any.
    pub fn promoted(&self) -> Option<Self> {
        match self {
            ValidatorTier::Scout => Some(ValidatorTier::Auditor),
            ValidatorTier::Auditor => Some(ValidatorTier::Arbiter),
            ValidatorTier::Arbiter => None,
        }
    }

    /// What it takes to leave this tier upward, if an upward tier exists.
    pub fn promotion_requirements(&self) -> Option<PromotionRequirements> {
        match self {
            ValidatorTier::Scout => Some(PromotionRequirements {
                min_days_in_tier: 30,
                min_calibration: 0.7,
                min_verdicts: 50,
                min_stake: AUDITOR_MIN_STAKE,
                slash_free_days: None,
            }),
            ValidatorTier::Auditor => Some(PromotionRequirements {
                min_days_in_tier: 90,
                min_calibration: 0.85,
                min_verdicts: 200,
                min_stake: ARBITER_MIN_STAKE,
                slash_free_days: Some(60),
            }),
            ValidatorTier::Arbiter => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValidatorTier::Scout => "scout",
            ValidatorTier::Auditor => "auditor",
            ValidatorTier::Arbiter => "arbiter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stake() {
        assert_eq!(ValidatorTier::from_stake(99.9), None);
        assert_eq!(ValidatorTier::from_stake(100.0), Some(ValidatorTier::Scout));
        assert_eq!(ValidatorTier::from_stake(499.0), Some(ValidatorTier::Scout));
        assert_eq!(ValidatorTier::from_stake(500.0), Some(ValidatorTier::Auditor));
        assert_eq!(ValidatorTier::from_stake(2_000.0), Some(ValidatorTier::Arbiter));
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ValidatorTier::Scout < ValidatorTier::Auditor);
        assert!(ValidatorTier::Auditor < ValidatorTier::Arbiter);
    }

    #[test]
    fn test_demotion_chain() {
        assert_eq!(ValidatorTier::Arbiter.demoted(), Some(ValidatorTier::Auditor));
        assert_eq!(ValidatorTier::Auditor.demoted(), Some(ValidatorTier::Scout));
        assert_eq!(ValidatorTier::Scout.demoted(), None);
    }

    #[test]
    fn test_caps_and_floors() {
        assert_eq!(ValidatorTier::Scout.epoch_case_cap(), Some(10));
        assert_eq!(ValidatorTier::Auditor.epoch_case_cap(), Some(50));
        assert_eq!(ValidatorTier::Arbiter.epoch_case_cap(), None);
        assert_eq!(ValidatorTier::Arbiter.calibration_floor(), 0.85);
    }

    #[test]
    fn test_promotion_requirements() {
        let scout = ValidatorTier::Scout.promotion_requirements().unwrap();
        assert_eq!(scout.min_days_in_tier, 30);
        assert_eq!(scout.slash_free_days, None);

        let auditor = ValidatorTier::Auditor.promotion_requirements().unwrap();
        assert_eq!(auditor.min_verdicts, 200);
        assert_eq!(auditor.slash_free_days, Some(60));

        assert!(ValidatorTier::Arbiter.promotion_requirements().is_none());
    }
}
