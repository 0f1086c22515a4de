//! Usage ledger: rolling, day-bucketed counters backing daily caps.
//!
//! The reset is lazy. Nothing ticks at midnight; every access compares the stored day marker
//! with the day of the check-time clock and treats a stale window as empty.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::module::constants::SECONDS_PER_DAY;

/// Day bucket index of a timestamp.
pub fn day_index(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageWindow {
    /// Running total within `day_marker`.
    pub used_amount: U256,
    /// Day index of the last committed update.
    pub day_marker: u64,
}

impl UsageWindow {
    /// Amount used so far on `day`, applying the lazy reset to the view only.
    pub fn used_on(&self, day: u64) -> U256 {
        if day == self.day_marker {
            self.used_amount
        } else {
            U256::ZERO
        }
    }

    /// The window after adding `amount` on `day`.
    ///
    /// Returns the would-be window without touching `self`; the caller commits it only once
    /// every check has passed. `None` when the total does not fit in 256 bits.
    pub fn advanced(&self, day: u64, amount: U256) -> Option<UsageWindow> {
        let used_amount = self.used_on(day).checked_add(amount)?;
        Some(UsageWindow {
            used_amount,
            day_marker: day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_day_accumulates() {
        let w = UsageWindow::default();
        let w = w.advanced(5, U256::from(3u64)).unwrap();
        let w = w.advanced(5, U256::from(4u64)).unwrap();
        assert_eq!(w.used_amount, U256::from(7u64));
        assert_eq!(w.day_marker, 5);
    }

    #[test]
    fn new_day_resets_before_adding() {
        let w = UsageWindow {
            used_amount: U256::from(9u64),
            day_marker: 5,
        };
        assert_eq!(w.used_on(6), U256::ZERO);
        let w = w.advanced(6, U256::from(10u64)).unwrap();
        assert_eq!(w.used_amount, U256::from(10u64));
    }

    #[test]
    fn overflow_is_reported() {
        let w = UsageWindow {
            used_amount: U256::MAX,
            day_marker: 1,
        };
        assert!(w.advanced(1, U256::from(1u64)).is_none());
        assert!(w.advanced(2, U256::from(1u64)).is_some());
    }

    #[test]
    fn day_boundaries() {
        assert_eq!(day_index(SECONDS_PER_DAY - 1), 0);
        assert_eq!(day_index(SECONDS_PER_DAY), 1);
    }

    proptest! {
        #[test]
        fn any_later_day_reads_zero(used in any::<u64>(), day in 0u64..1_000_000, gap in 1u64..1_000) {
            let w = UsageWindow { used_amount: U256::from(used), day_marker: day };
            prop_assert_eq!(w.used_on(day + gap), U256::ZERO);
            prop_assert_eq!(w.used_on(day), U256::from(used));
        }
    }
}
