//! Pacing clock
//!
//! The target index is derived from scratch on every evaluation:
//! `floor(elapsed_micros / interval_micros)` since playback started. Nothing
//! is accumulated, so a rate change re-paces future frames immediately
//! without rebasing the elapsed-time origin.

use std::time::Duration;
use tokio::time::Instant;

/// Maps wall-clock time within one playback run to frame indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingClock {
    started_at: Instant,
    interval_micros: u64,
}

impl PacingClock {
    pub fn new(started_at: Instant, interval_micros: u64) -> Self {
        Self { started_at, interval_micros: interval_micros.max(1) }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn interval_micros(&self) -> u64 {
        self.interval_micros
    }

    /// Index that should be visible at `now`
    pub fn target_index(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_micros();
        u64::try_from(elapsed / u128::from(self.interval_micros)).unwrap_or(u64::MAX)
    }

    /// Instant at which `index` becomes due, if representable
    pub fn deadline(&self, index: u64) -> Option<Instant> {
        let offset = self.interval_micros.checked_mul(index)?;
        self.started_at.checked_add(Duration::from_micros(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FrameRate;

    fn sixty_fps_clock(start: Instant) -> PacingClock {
        PacingClock::new(start, FrameRate::new(60.0).unwrap().interval_micros())
    }

    #[test]
    fn target_index_truncates_elapsed_time() {
        let start = Instant::now();
        let clock = sixty_fps_clock(start);

        assert_eq!(clock.target_index(start), 0);
        assert_eq!(clock.target_index(start + Duration::from_micros(16_666)), 0);
        assert_eq!(clock.target_index(start + Duration::from_micros(16_667)), 1);
        assert_eq!(clock.target_index(start + Duration::from_micros(50_000)), 2);
        assert_eq!(clock.target_index(start + Duration::from_micros(100_000)), 5);
    }

    #[test]
    fn instants_before_start_map_to_zero() {
        let now = Instant::now();
        let clock = sixty_fps_clock(now + Duration::from_secs(1));
        assert_eq!(clock.target_index(now), 0);
    }

    #[test]
    fn deadline_is_first_instant_of_index() {
        let start = Instant::now();
        let clock = sixty_fps_clock(start);

        for index in 0..20 {
            let deadline = clock.deadline(index).unwrap();
            assert_eq!(clock.target_index(deadline), index);
            if index > 0 {
                assert_eq!(clock.target_index(deadline - Duration::from_micros(1)), index - 1);
            }
        }
    }

    #[test]
    fn rate_change_keeps_elapsed_origin() {
        let start = Instant::now();
        let now = start + Duration::from_millis(500);

        let slow = PacingClock::new(start, 100_000);
        let fast = PacingClock::new(slow.started_at(), 10_000);

        assert_eq!(slow.target_index(now), 5);
        assert_eq!(fast.target_index(now), 50);
    }

    #[test]
    fn overflowing_deadline_is_none() {
        let clock = PacingClock::new(Instant::now(), u64::MAX / 2);
        assert!(clock.deadline(4).is_none());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn target_index_matches_floor_division(
            interval in 1u64..1_000_000u64,
            elapsed in 0u64..10_000_000_000u64,
          ) {
            let start = Instant::now();
            let clock = PacingClock::new(start, interval);
            let now = start + Duration::from_micros(elapsed);

            prop_assert_eq!(clock.target_index(now), elapsed / interval);
          }

          #[test]
          fn target_index_is_monotonic(
            interval in 1u64..100_000u64,
            a in 0u64..1_000_000_000u64,
            b in 0u64..1_000_000_000u64,
          ) {
            let start = Instant::now();
            let clock = PacingClock::new(start, interval);
            let (early, late) = (a.min(b), a.max(b));

            prop_assert!(
              clock.target_index(start + Duration::from_micros(early))
                <= clock.target_index(start + Duration::from_micros(late))
            );
          }
        }
    }
}
