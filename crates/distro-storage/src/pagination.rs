//! Key- and offset-based pagination over ordered scans
//!
//! Semantics follow the usual ledger query conventions:
//! - `key` and `offset` are mutually exclusive
//! - `limit == 0` means the default limit and implies `count_total`
//! - `next_key` is the first key of the following page, `None` on the last page
//! - `total` is only computed for offset-based requests that ask for it

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when the request leaves `limit` at zero
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Pagination errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to decode entry '{key}': {reason}")]
    Decode { key: String, reason: String },
}

/// Page request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Resume from this key (inclusive)
    #[serde(default)]
    pub key: Option<Vec<u8>>,
    /// Skip this many entries
    #[serde(default)]
    pub offset: u64,
    /// Maximum entries returned
    #[serde(default)]
    pub limit: u64,
    /// Compute the total entry count
    #[serde(default)]
    pub count_total: bool,
    /// Iterate in descending key order
    #[serde(default)]
    pub reverse: bool,
}

impl PageRequest {
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn with_offset(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    pub fn with_key(key: impl Into<Vec<u8>>, limit: u64) -> Self {
        Self {
            key: Some(key.into()),
            limit,
            ..Self::default()
        }
    }

    pub fn count_total(mut self) -> Self {
        self.count_total = true;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// One page of results
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub entries: Vec<T>,
    /// First key of the next page
    pub next_key: Option<Vec<u8>>,
    /// Total entries, when requested
    pub total: Option<u64>,
}

/// Paginate an ascending, prefix-stripped scan
pub fn paginate<T, F>(
    mut entries: Vec<(Vec<u8>, Vec<u8>)>,
    request: &PageRequest,
    mut decode: F,
) -> Result<PageResponse<T>, PaginationError>
where
    F: FnMut(&[u8], &[u8]) -> Result<T, PaginationError>,
{
    if request.key.is_some() && request.offset > 0 {
        return Err(PaginationError::InvalidRequest(
            "either offset or key is expected, got both".to_string(),
        ));
    }

    let (limit, count_total) = if request.limit == 0 {
        (DEFAULT_PAGE_LIMIT, true)
    } else {
        (request.limit, request.count_total)
    };

    if request.reverse {
        entries.reverse();
    }

    let start = match &request.key {
        Some(key) => entries
            .iter()
            .position(|(k, _)| {
                if request.reverse {
                    k <= key
                } else {
                    k >= key
                }
            })
            .unwrap_or(entries.len()),
        None => usize::try_from(request.offset)
            .unwrap_or(usize::MAX)
            .min(entries.len()),
    };
    let end = start
        .saturating_add(usize::try_from(limit).unwrap_or(usize::MAX))
        .min(entries.len());

    let mut items = Vec::with_capacity(end - start);
    for (key, value) in &entries[start..end] {
        items.push(decode(key, value)?);
    }

    let next_key = entries.get(end).map(|(k, _)| k.clone());
    let total = (count_total && request.key.is_none()).then_some(entries.len() as u64);

    Ok(PageResponse {
        entries: items,
        next_key,
        total,
    })
}
