//! Read-only queries over the daily total ledger

use serde::{Deserialize, Serialize};
use thiserror::Error;

use distro_core::{Amount, DistributionDate};
use distro_storage::{paginate, KvStore, PageRequest, PageResponse, PaginationError, StorageError};

use crate::daily_total::{decode_date, decode_total, DailyTotalLedger};

/// Query errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid date '{date}': {reason}")]
    InvalidDate { date: String, reason: String },

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One recorded daily total
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotalEntry {
    pub date: DistributionDate,
    pub amount: Amount,
}

impl DailyTotalEntry {
    /// Amount with its denom suffix, e.g. `123uOPT`
    pub fn formatted(&self, denom: &str) -> String {
        format!("{}{}", self.amount, denom)
    }
}

/// Total released on `date`, `None` if nothing has been
pub fn get_daily_total<S: KvStore + ?Sized>(store: &S, date: &str) -> Result<Option<Amount>, QueryError> {
    let date = DistributionDate::parse(date).map_err(|e| QueryError::InvalidDate {
        date: date.to_string(),
        reason: e.to_string(),
    })?;
    Ok(DailyTotalLedger::new(store).get(&date)?)
}

/// Page through recorded totals in date order
pub fn list_daily_totals<S: KvStore + ?Sized>(
    store: &S,
    request: &PageRequest,
) -> Result<PageResponse<DailyTotalEntry>, QueryError> {
    let entries = DailyTotalLedger::new(store).scan()?;
    let page = paginate(entries, request, |key, value| {
        let entry = decode_date(key).and_then(|date| {
            decode_total(key, value).map(|amount| DailyTotalEntry { date, amount })
        });
        entry.map_err(|e| PaginationError::Decode {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: e.to_string(),
        })
    })?;
    Ok(page)
}
