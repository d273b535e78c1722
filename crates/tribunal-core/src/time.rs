use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix seconds.
///
/// Deadlines are stored as absolute instants; every time-sensitive engine
/// operation also has an `*_at(now)` variant for callers that carry an
/// auditable clock.
pub fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs()
}

/// Whole days elapsed between two instants, saturating at zero.
pub fn days_between(earlier: u64, later: u64) -> u64 {
    later.saturating_sub(earlier) / 86_400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(0, 86_400 * 3), 3);
        assert_eq!(days_between(100, 100 + 86_399), 0);
        assert_eq!(days_between(500, 100), 0);
    }
}
