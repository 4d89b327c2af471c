//! # Emission Schedule
//!
//! Geometric halving of the daily emission cap.
//!
//! ## Halving Periods
//!
//! ```text
//! Period 1: start .. start + M months - 1 day   → (max_supply >> 1) / days
//! Period 2: next M months                       → (max_supply >> 2) / days
//! Period 3: next M months                       → (max_supply >> 3) / days
//! ...continues halving until the cap reaches zero...
//! ```
//!
//! With the default parameters (start 2024-09-15, 12-month periods,
//! 3e16 max supply) the first period runs 2024-09-15..2025-09-14 and
//! allows 41_095_890_410_958 units per day.
//!
//! Every function here is pure: the same date and parameters always give
//! the same cap. Dates before the start date, dates past the last
//! representable period, and days that fall outside their computed window
//! all get a cap of zero.

use distro_core::{DistributionDate, EmissionParams};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_HALVING_PERIOD;

/// One halving period
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalvingPeriod {
    /// 1-based period index
    pub index: u64,
    /// First day of the period
    pub start: DistributionDate,
    /// Last day of the period (inclusive)
    pub end: DistributionDate,
}

impl HalvingPeriod {
    /// Number of days in the period, both ends included
    pub fn days(&self) -> u64 {
        u64::try_from(self.end.days_since(&self.start) + 1).unwrap_or(0)
    }

    pub fn contains(&self, date: &DistributionDate) -> bool {
        self.start <= *date && *date <= self.end
    }
}

/// Emission schedule derived from a parameter snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    /// First day of period 1
    pub start_date: DistributionDate,
    /// Months per halving period (> 0)
    pub months_in_halving_period: u32,
    /// Supply ceiling the periods are carved from
    pub max_supply: u64,
}

impl EmissionSchedule {
    pub fn new(start_date: DistributionDate, months_in_halving_period: u32, max_supply: u64) -> Self {
        Self {
            start_date,
            months_in_halving_period,
            max_supply,
        }
    }

    pub fn from_params(params: &EmissionParams) -> Self {
        Self::new(
            params.distribution_start_date,
            params.months_in_halving_period,
            params.max_supply,
        )
    }

    /// Whole calendar months from the start date to `date`
    ///
    /// A month only counts once `date` reaches the start date's
    /// day-of-month. `None` before the start date.
    pub fn months_elapsed(&self, date: &DistributionDate) -> Option<u64> {
        if *date < self.start_date {
            return None;
        }

        let start = &self.start_date;
        let mut months = i64::from(date.year() - start.year()) * 12
            + i64::from(date.month())
            - i64::from(start.month());
        if date.day() < start.day() {
            months -= 1;
        }
        u64::try_from(months).ok()
    }

    /// 1-based halving period index for `date`
    pub fn halving_period(&self, date: &DistributionDate) -> Option<u64> {
        if self.months_in_halving_period == 0 {
            return None;
        }
        let months = self.months_elapsed(date)?;
        Some(1 + months / u64::from(self.months_in_halving_period))
    }

    /// Calendar window of period `index`
    pub fn period(&self, index: u64) -> Option<HalvingPeriod> {
        if index == 0 {
            return None;
        }
        let span = u64::from(self.months_in_halving_period);
        let start_offset = u32::try_from((index - 1).checked_mul(span)?).ok()?;
        let end_offset = u32::try_from(index.checked_mul(span)?).ok()?;

        let start = self.start_date.checked_add_months(start_offset)?;
        let end = self.start_date.checked_add_months(end_offset)?.pred()?;
        Some(HalvingPeriod { index, start, end })
    }

    /// The period containing `date`, if its window really contains it
    pub fn period_for(&self, date: &DistributionDate) -> Option<HalvingPeriod> {
        let index = self.halving_period(date)?;
        let period = self.period(index)?;
        period.contains(date).then_some(period)
    }

    /// Supply allotted to period `index`
    pub fn period_supply(&self, index: u64) -> u64 {
        if index > MAX_HALVING_PERIOD {
            return 0;
        }
        self.max_supply >> index
    }

    /// Maximum cumulative amount distributable on `date`
    pub fn daily_limit(&self, date: &DistributionDate) -> u64 {
        let Some(index) = self.halving_period(date) else {
            tracing::trace!(%date, "date precedes emission start");
            return 0;
        };
        if index > MAX_HALVING_PERIOD {
            tracing::trace!(%date, index, "halving period past last representable period");
            return 0;
        }
        let Some(period) = self.period(index) else {
            return 0;
        };
        if !period.contains(date) {
            tracing::debug!(%date, index, start = %period.start, end = %period.end, "date outside computed period window");
            return 0;
        }

        match period.days() {
            0 => 0,
            days => self.period_supply(index) / days,
        }
    }
}

/// Maximum cumulative amount distributable on `date` under `params`
pub fn daily_limit(date: &DistributionDate, params: &EmissionParams) -> u64 {
    EmissionSchedule::from_params(params).daily_limit(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> DistributionDate {
        DistributionDate::parse(s).unwrap()
    }

    fn default_schedule() -> EmissionSchedule {
        EmissionSchedule::new(date("2024-09-15"), 12, 30_000_000_000_000_000)
    }

    #[test]
    fn test_first_period_limit() {
        let schedule = default_schedule();

        assert_eq!(schedule.halving_period(&date("2024-09-20")), Some(1));
        let period = schedule.period(1).unwrap();
        assert_eq!(period.start, date("2024-09-15"));
        assert_eq!(period.end, date("2025-09-14"));
        assert_eq!(period.days(), 365);

        assert_eq!(schedule.daily_limit(&date("2024-09-20")), 41_095_890_410_958);
        assert_eq!(schedule.daily_limit(&date("2024-09-15")), 41_095_890_410_958);
        assert_eq!(schedule.daily_limit(&date("2025-09-14")), 41_095_890_410_958);
    }

    #[test]
    fn test_halving() {
        let schedule = default_schedule();

        assert_eq!(schedule.halving_period(&date("2025-09-15")), Some(2));
        assert_eq!(schedule.daily_limit(&date("2025-09-15")), 20_547_945_205_479);

        // 2027-09-15..2028-09-14 spans a leap day
        let period = schedule.period(4).unwrap();
        assert_eq!(period.days(), 366);
        assert_eq!(schedule.daily_limit(&date("2028-02-29")), 5_122_950_819_672);
    }

    #[test]
    fn test_before_start_is_zero() {
        let schedule = default_schedule();
        assert_eq!(schedule.months_elapsed(&date("2024-09-14")), None);
        assert_eq!(schedule.daily_limit(&date("2024-09-14")), 0);
        assert_eq!(schedule.daily_limit(&date("2000-01-01")), 0);
    }

    #[test]
    fn test_months_elapsed_floor() {
        let schedule = default_schedule();
        assert_eq!(schedule.months_elapsed(&date("2024-10-14")), Some(0));
        assert_eq!(schedule.months_elapsed(&date("2024-10-15")), Some(1));
        assert_eq!(schedule.months_elapsed(&date("2025-09-14")), Some(11));
        assert_eq!(schedule.months_elapsed(&date("2025-09-15")), Some(12));
    }

    #[test]
    fn test_small_supply_example() {
        let schedule = EmissionSchedule::new(date("2024-09-15"), 12, 657_000);
        assert_eq!(schedule.daily_limit(&date("2025-03-01")), 900);
    }

    #[test]
    fn test_past_last_period_is_zero() {
        let schedule = EmissionSchedule::new(date("2024-09-15"), 1, u64::MAX);
        // period 64 starts 63 months in
        let late = schedule.period(64).unwrap().start;
        assert_eq!(schedule.halving_period(&late), Some(64));
        assert_eq!(schedule.daily_limit(&late), 0);

        assert_eq!(schedule.period_supply(63), 1);
        assert_eq!(schedule.period_supply(64), 0);
    }

    #[test]
    fn test_leap_day_start() {
        let schedule = EmissionSchedule::new(date("2024-02-29"), 12, 30_000_000_000_000_000);

        let first = schedule.period(1).unwrap();
        assert_eq!((first.start, first.end), (date("2024-02-29"), date("2025-02-28")));
        assert_eq!(first.days(), 366);
        assert_eq!(schedule.daily_limit(&date("2024-03-01")), 40_983_606_557_377);
        assert_eq!(schedule.daily_limit(&date("2025-02-28")), 40_983_606_557_377);

        let second = schedule.period(2).unwrap();
        assert_eq!((second.start, second.end), (date("2025-03-01"), date("2026-02-28")));
        assert_eq!(schedule.daily_limit(&date("2025-03-01")), 20_547_945_205_479);
    }

    #[test]
    fn test_month_end_start_rolls_into_next_month() {
        let schedule = EmissionSchedule::new(date("2024-01-31"), 1, 30_000_000_000_000_000);

        let first = schedule.period(1).unwrap();
        assert_eq!(first.end, date("2024-03-01"));
        assert_eq!(first.days(), 31);
        assert_eq!(schedule.daily_limit(&date("2024-02-29")), 483_870_967_741_935);

        // counted as month 1, but period 2 only opens on 2024-03-02
        assert_eq!(schedule.halving_period(&date("2024-03-01")), Some(2));
        assert_eq!(schedule.period_for(&date("2024-03-01")), None);
        assert_eq!(schedule.daily_limit(&date("2024-03-01")), 0);

        let second = schedule.period(2).unwrap();
        assert_eq!((second.start, second.end), (date("2024-03-02"), date("2024-03-30")));
        assert_eq!(schedule.daily_limit(&date("2024-03-02")), 258_620_689_655_172);
    }

    #[test]
    fn test_zero_period_length() {
        let schedule = EmissionSchedule::new(date("2024-09-15"), 0, 1_000_000);
        assert_eq!(schedule.halving_period(&date("2025-01-01")), None);
        assert_eq!(schedule.daily_limit(&date("2025-01-01")), 0);
    }

    #[test]
    fn test_from_params() {
        let params = EmissionParams::default();
        assert_eq!(
            daily_limit(&date("2024-09-20"), &params),
            default_schedule().daily_limit(&date("2024-09-20"))
        );
    }

    fn arb_date() -> impl Strategy<Value = DistributionDate> {
        (2024i32..2040, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| DistributionDate::from_ymd(y, m, d).unwrap())
    }

    proptest! {
        #[test]
        fn prop_limit_non_increasing_across_periods(
            a in arb_date(),
            b in arb_date(),
            months in 1u32..=24,
            max_supply in 1u64..=u64::MAX,
        ) {
            let schedule = EmissionSchedule::new(date("2024-01-10"), months, max_supply);
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            if let (Some(pe), Some(pl)) = (schedule.halving_period(&early), schedule.halving_period(&late)) {
                prop_assert!(pe <= pl);
                prop_assert!(schedule.daily_limit(&late) <= schedule.daily_limit(&early));
            }
        }

        #[test]
        fn prop_limit_constant_within_period(
            d in arb_date(),
            months in 1u32..=24,
            max_supply in 1u64..=u64::MAX,
        ) {
            let schedule = EmissionSchedule::new(date("2024-01-10"), months, max_supply);
            if let Some(period) = schedule.period_for(&d) {
                let limit = schedule.daily_limit(&d);
                prop_assert_eq!(schedule.daily_limit(&period.start), limit);
                prop_assert_eq!(schedule.daily_limit(&period.end), limit);
            }
        }
    }
}
