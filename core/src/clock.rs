//! Store clock. Virtual milliseconds since store start, mapped onto wall time.

use crate::types::Millis;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub origin: DateTime<Utc>,
    pub elapsed_ms: Millis,
}

impl SimClock {
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self { origin, elapsed_ms: 0 }
    }

    /// Move the clock forward to `ms`. Never moves backwards.
    /// Returns the new elapsed time.
    pub fn advance_to(&mut self, ms: Millis) -> Millis {
        if ms > self.elapsed_ms {
            self.elapsed_ms = ms;
        }
        self.elapsed_ms
    }

    /// `elapsed_ms` only ever holds points that `at` can represent.
    pub fn now(&self) -> DateTime<Utc> {
        self.at(self.elapsed_ms).unwrap_or(self.origin)
    }

    /// Wall time of an arbitrary point on the virtual timeline, or `None` when
    /// it lies past the end of chrono's range.
    pub fn at(&self, ms: Millis) -> Option<DateTime<Utc>> {
        let ms = i64::try_from(ms).ok()?;
        self.origin.checked_add_signed(Duration::milliseconds(ms))
    }

    /// Wall time `days` before store start; used for seeded history.
    pub fn days_ago(&self, days: i64) -> DateTime<Utc> {
        self.origin - Duration::days(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let mut clock = SimClock::new(Utc::now());
        assert_eq!(clock.advance_to(500), 500);
        assert_eq!(clock.advance_to(200), 500);
        assert_eq!(clock.now(), clock.origin + Duration::milliseconds(500));
    }

    #[test]
    fn unrepresentable_points_have_no_wall_time() {
        let clock = SimClock::new(Utc::now());
        assert!(clock.at(60_000).is_some());
        assert_eq!(clock.at(u64::MAX), None);
        assert_eq!(clock.at(i64::MAX as u64), None);
    }
}
