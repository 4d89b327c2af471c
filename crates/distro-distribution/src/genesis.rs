//! Genesis import and export
//!
//! A genesis state is the parameter snapshot plus every recorded daily
//! total. Totals can also be seeded from a bare JSON list of
//! `{ "date": ..., "amount": ... }` records, where amounts may be written
//! as integral floats.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use distro_core::{Amount, DistributionDate, EmissionParams, ParamsError};
use distro_storage::{KvStore, StorageError, WriteBatch};

use crate::daily_total::DailyTotalLedger;

/// Genesis errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenesisError {
    #[error("invalid params: {0}")]
    Params(#[from] ParamsError),

    #[error("invalid daily total date '{date}': {reason}")]
    InvalidDate { date: String, reason: String },

    #[error("duplicated daily total for {0}")]
    DuplicateDate(String),

    #[error("invalid genesis JSON: {0}")]
    Json(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for GenesisError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// One seeded daily total
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotalRecord {
    pub date: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
}

/// Module genesis state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: EmissionParams,
    #[serde(default)]
    pub daily_distribution_totals: Vec<DailyTotalRecord>,
}

impl GenesisState {
    pub fn new(params: EmissionParams, daily_distribution_totals: Vec<DailyTotalRecord>) -> Self {
        Self {
            params,
            daily_distribution_totals,
        }
    }

    /// Params are valid, every date is canonical and appears once
    pub fn validate(&self) -> Result<(), GenesisError> {
        let mut seen = BTreeSet::new();
        for record in &self.daily_distribution_totals {
            let date = parse_record_date(&record.date)?;
            if !seen.insert(date) {
                return Err(GenesisError::DuplicateDate(record.date.clone()));
            }
        }
        self.params.validate()?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, GenesisError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, GenesisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse a bare JSON list of daily total records
pub fn parse_daily_totals(json: &str) -> Result<Vec<DailyTotalRecord>, GenesisError> {
    Ok(serde_json::from_str(json)?)
}

/// Write every daily total in `genesis` to the store in one batch
pub fn init_genesis<S: KvStore + ?Sized>(store: &S, genesis: &GenesisState) -> Result<(), GenesisError> {
    genesis.validate()?;

    let ledger = DailyTotalLedger::new(store);
    let mut writes = WriteBatch::new();
    for record in &genesis.daily_distribution_totals {
        ledger.stage_set(&mut writes, &parse_record_date(&record.date)?, record.amount);
    }
    store.apply(writes)?;

    tracing::info!(
        daily_totals = genesis.daily_distribution_totals.len(),
        denom = %genesis.params.denom,
        "genesis initialized"
    );
    Ok(())
}

/// Read back the genesis state, totals in date order
pub fn export_genesis<S: KvStore + ?Sized>(store: &S, params: &EmissionParams) -> Result<GenesisState, GenesisError> {
    let daily_distribution_totals = DailyTotalLedger::new(store)
        .entries()?
        .into_iter()
        .map(|(date, amount)| DailyTotalRecord {
            date: date.to_string(),
            amount,
        })
        .collect();

    Ok(GenesisState::new(params.clone(), daily_distribution_totals))
}

fn parse_record_date(date: &str) -> Result<DistributionDate, GenesisError> {
    DistributionDate::parse(date).map_err(|e| GenesisError::InvalidDate {
        date: date.to_string(),
        reason: e.to_string(),
    })
}

/// Accept integers, integral floats and decimal strings
fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integral amount")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            Amount::try_from(v).map_err(|_| E::custom(format!("negative amount {}", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
            // 2^64 is exactly representable as f64
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < 18_446_744_073_709_551_616.0 {
                Ok(v as Amount)
            } else {
                Err(E::custom(format!("amount {} is not a u64", v)))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            v.parse().map_err(|_| E::custom(format!("amount '{}' is not a u64", v)))
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}
