//! Error types for distro core operations

use thiserror::Error;

/// Result type alias for distribution operations
pub type Result<T> = std::result::Result<T, DistributionError>;

/// Reasons a distribution batch is rejected
///
/// Every variant carries enough context to log the offending date, nonce or
/// address. Signature failures never say which sub-check failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistributionError {
    // === Authorization ===
    /// Signer is not in the authorized account set
    #[error("Unauthorized signer: {signer}")]
    Unauthorized { signer: String },

    /// Instruction signature did not verify
    #[error("Signature verification failed for nonce '{nonce}'")]
    SignatureInvalid { nonce: String },

    /// Nonce was consumed earlier (or twice in this batch)
    #[error("Nonce already used: '{nonce}'")]
    NonceReused { nonce: String },

    // === Supply & Limits ===
    /// Circulating supply plus the batch would exceed max supply
    #[error("Max supply exceeded: current {current} + requested {requested} > max {max}")]
    SupplyExceeded {
        current: u128,
        requested: u64,
        max: u64,
    },

    /// The per-date emission cap would be exceeded
    #[error("Date '{date}' exceeds daily limit: already {already} + batch {requested} > limit {limit}")]
    DailyLimitExceeded {
        date: String,
        already: u64,
        requested: u64,
        limit: u64,
    },

    // === Request Shape ===
    /// Declared total differs from the sum of instruction amounts
    #[error("Declared amount {declared} does not match instruction total {computed:?}")]
    AmountMismatch {
        declared: u64,
        /// `None` when the instruction sum overflows
        computed: Option<u64>,
    },

    /// Date unparseable, before the distribution start or after block time
    #[error("Invalid distribution date '{date}': {reason}")]
    InvalidDate { date: String, reason: String },

    /// Address is not a canonical account address
    #[error("Invalid address '{address}'")]
    InvalidAddress { address: String },

    /// Structurally invalid request (empty recipients, zero total, empty nonce)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Storage ===
    /// Store adapter failure; fatal for the batch
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl DistributionError {
    /// Get the error code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 2001,
            Self::SupplyExceeded { .. } => 2002,
            Self::InvalidDate { .. } => 2003,
            Self::NonceReused { .. } => 2004,
            Self::SignatureInvalid { .. } => 2005,
            Self::AmountMismatch { .. } => 2006,
            Self::DailyLimitExceeded { .. } => 2007,
            Self::InvalidAddress { .. } => 2008,
            Self::InvalidRequest(_) => 2009,
            Self::StorageFailure(_) => 9001,
        }
    }

    /// Failures of the store adapter rather than of the request itself
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }

    /// Short stable label for logs and counters
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::SupplyExceeded { .. } => "supply_exceeded",
            Self::InvalidDate { .. } => "invalid_date",
            Self::NonceReused { .. } => "nonce_reused",
            Self::SignatureInvalid { .. } => "signature_invalid",
            Self::AmountMismatch { .. } => "amount_mismatch",
            Self::DailyLimitExceeded { .. } => "daily_limit_exceeded",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::InvalidRequest(_) => "invalid_request",
            Self::StorageFailure(_) => "storage_failure",
        }
    }
}

/// Parameter snapshot validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("invalid authorized account address: {0}")]
    InvalidAuthorizedAccount(String),

    #[error("denom cannot be empty")]
    EmptyDenom,

    #[error("max supply must be positive")]
    ZeroMaxSupply,

    #[error("months in halving period must be positive")]
    ZeroHalvingPeriod,

    #[error("invalid distribution start date: {0}")]
    InvalidStartDate(String),

    #[error("invalid distribution signer public key: {0}")]
    InvalidSignerKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DistributionError::Unauthorized {
            signer: "0xdead".to_string(),
        };
        assert_eq!(err.code(), 2001);

        let err = DistributionError::StorageFailure("disk".to_string());
        assert_eq!(err.code(), 9001);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_error_display_carries_context() {
        let err = DistributionError::DailyLimitExceeded {
            date: "2025-03-01".to_string(),
            already: 0,
            requested: 1000,
            limit: 900,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("2025-03-01"));
        assert!(msg.contains("900"));

        let err = DistributionError::SignatureInvalid {
            nonce: "7".to_string(),
        };
        assert_eq!(format!("{}", err), "Signature verification failed for nonce '7'");
    }

    #[test]
    fn test_validation_errors_are_not_fatal() {
        assert!(!DistributionError::NonceReused { nonce: "1".into() }.is_fatal());
        assert_eq!(
            DistributionError::AmountMismatch {
                declared: 1,
                computed: Some(2)
            }
            .kind(),
            "amount_mismatch"
        );
    }
}
