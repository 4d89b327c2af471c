//! # Distro Economics - Emission Schedule
//!
//! The daily emission cap of the distribution module.
//!
//! ## Key Features
//!
//! - **Geometric halving**: each period gets half the supply of the one before
//! - **Calendar periods**: periods are whole calendar months, not seconds
//! - **Integer exact**: every cap is a floor division, so a period never
//!   releases more than its allotment
//!
//! ## Emission Schedule (defaults)
//!
//! | Period | Dates | Period Supply | Daily Cap |
//! |--------|-------|---------------|-----------|
//! | 1 | 2024-09-15..2025-09-14 | 1.5e16 uOPT | 41_095_890_410_958 |
//! | 2 | 2025-09-15..2026-09-14 | 7.5e15 uOPT | 20_547_945_205_479 |
//! | 3 | 2026-09-15..2027-09-14 | 3.75e15 uOPT | 10_273_972_602_739 |
//! | ... | ... | (halving continues) | ... |

pub mod emission;

pub use emission::{daily_limit, EmissionSchedule, HalvingPeriod};

/// Schedule constants
pub mod constants {
    /// Last period whose supply is a defined shift of a `u64`
    pub const MAX_HALVING_PERIOD: u64 = 63;

    pub use distro_core::{DEFAULT_DENOM, DEFAULT_MAX_SUPPLY, DEFAULT_MONTHS_IN_HALVING_PERIOD};
}

pub use constants::*;

#[cfg(test)]
mod tests {
    use super::*;
    use distro_core::{DistributionDate, EmissionParams};

    #[test]
    fn test_default_table() {
        let schedule = EmissionSchedule::from_params(&EmissionParams::default());
        let third = schedule.period(3).unwrap();
        assert_eq!(third.start, DistributionDate::parse("2026-09-15").unwrap());
        assert_eq!(schedule.daily_limit(&third.start), 10_273_972_602_739);
    }

    #[test]
    fn test_max_period_shift() {
        assert_eq!(DEFAULT_MAX_SUPPLY >> MAX_HALVING_PERIOD, 0);
        assert_eq!(u64::MAX >> MAX_HALVING_PERIOD, 1);
    }
}
