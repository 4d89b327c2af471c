//! Emission parameter snapshot
//!
//! Parameters are immutable during normal operation. Callers build one
//! validated snapshot and pass it into every core call; a parameter change
//! produces a new snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::date::DistributionDate;
use crate::error::ParamsError;
use crate::types::Address;

/// Default asset denomination
pub const DEFAULT_DENOM: &str = "uOPT";

/// Default maximum total supply (smallest units)
pub const DEFAULT_MAX_SUPPLY: u64 = 30_000_000_000_000_000;

/// Default distribution start date
pub const DEFAULT_DISTRIBUTION_START_DATE: &str = "2024-09-15";

/// Default halving cadence
pub const DEFAULT_MONTHS_IN_HALVING_PERIOD: u32 = 12;

/// Emission parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionParams {
    /// Signers allowed to submit batches (canonical addresses)
    #[serde(default)]
    pub authorized_accounts: BTreeSet<String>,

    /// Asset denomination identifier
    #[serde(default = "default_denom")]
    pub denom: String,

    /// Hard ceiling on circulating supply
    #[serde(default = "default_max_supply")]
    pub max_supply: u64,

    /// First day on which distributions may be dated
    #[serde(default = "default_start_date")]
    pub distribution_start_date: DistributionDate,

    /// Length of one halving period in calendar months
    #[serde(default = "default_months_in_halving_period")]
    pub months_in_halving_period: u32,

    /// Hex-encoded Ed25519 key that signs instructions (empty = none configured)
    #[serde(default)]
    pub distribution_signer_public_key: String,
}

fn default_denom() -> String {
    DEFAULT_DENOM.to_string()
}

fn default_max_supply() -> u64 {
    DEFAULT_MAX_SUPPLY
}

fn default_start_date() -> DistributionDate {
    // 2024-09-15 always exists
    DistributionDate::from_ymd(2024, 9, 15).unwrap_or_else(|| {
        DistributionDate::from_naive(chrono::NaiveDate::MIN)
    })
}

fn default_months_in_halving_period() -> u32 {
    DEFAULT_MONTHS_IN_HALVING_PERIOD
}

impl Default for EmissionParams {
    fn default() -> Self {
        Self {
            authorized_accounts: BTreeSet::new(),
            denom: default_denom(),
            max_supply: default_max_supply(),
            distribution_start_date: default_start_date(),
            months_in_halving_period: default_months_in_halving_period(),
            distribution_signer_public_key: String::new(),
        }
    }
}

impl EmissionParams {
    /// Create and validate a parameter snapshot
    pub fn new(
        authorized_accounts: impl IntoIterator<Item = String>,
        denom: impl Into<String>,
        max_supply: u64,
        distribution_start_date: DistributionDate,
        months_in_halving_period: u32,
        distribution_signer_public_key: impl Into<String>,
    ) -> Result<Self, ParamsError> {
        let params = Self {
            authorized_accounts: authorized_accounts.into_iter().collect(),
            denom: denom.into(),
            max_supply,
            distribution_start_date,
            months_in_halving_period,
            distribution_signer_public_key: distribution_signer_public_key.into(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Validate the set of params
    pub fn validate(&self) -> Result<(), ParamsError> {
        for account in &self.authorized_accounts {
            if Address::parse(account).is_err() {
                return Err(ParamsError::InvalidAuthorizedAccount(account.clone()));
            }
        }

        if self.denom.is_empty() {
            return Err(ParamsError::EmptyDenom);
        }

        if self.max_supply == 0 {
            return Err(ParamsError::ZeroMaxSupply);
        }

        if self.months_in_halving_period == 0 {
            return Err(ParamsError::ZeroHalvingPeriod);
        }

        if !self.distribution_signer_public_key.is_empty() {
            let bytes = hex::decode(&self.distribution_signer_public_key)
                .map_err(|e| ParamsError::InvalidSignerKey(e.to_string()))?;
            if bytes.len() != 32 {
                return Err(ParamsError::InvalidSignerKey(format!(
                    "expected 32 bytes, got {}",
                    bytes.len()
                )));
            }
        }

        Ok(())
    }

    /// Replace the authorized signer set, producing a new snapshot
    pub fn with_authorized_accounts(mut self, accounts: impl IntoIterator<Item = String>) -> Self {
        self.authorized_accounts = accounts.into_iter().collect();
        self
    }

    /// Replace the signer public key, producing a new snapshot
    pub fn with_signer_public_key(mut self, key_hex: impl Into<String>) -> Self {
        self.distribution_signer_public_key = key_hex.into();
        self
    }
}
