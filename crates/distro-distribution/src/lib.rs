//! # Distro Distribution
//!
//! Emission control for a ledger module that periodically issues a native
//! asset to batches of recipients.
//!
//! ## Components
//!
//! - **Nonce Registry**: single-use authorization tokens, kept forever
//! - **Daily Total Ledger**: cumulative amount released per calendar date
//! - **Bank**: mint/transfer primitives of the surrounding ledger
//! - **Distributor**: validates and commits one batch, all or nothing
//! - **Queries / Genesis**: read-only views and state import/export
//!
//! ## Invariants
//!
//! 1. Only a signer in the authorized set can move funds
//! 2. A nonce is accepted at most once, ever
//! 3. The total released on any date never exceeds that date's emission cap

pub mod bank;
pub mod daily_total;
pub mod distributor;
pub mod genesis;
pub mod keys;
pub mod nonce;
pub mod query;

pub use bank::{Balance, Bank, BankState, InMemoryBank, LedgerError};
pub use daily_total::DailyTotalLedger;
pub use distributor::{BlockContext, DistributionReceipt, DistributionStage, Distributor};
pub use genesis::{export_genesis, init_genesis, parse_daily_totals, DailyTotalRecord, GenesisError, GenesisState};
pub use nonce::NonceRegistry;
pub use query::{get_daily_total, list_daily_totals, DailyTotalEntry, QueryError};
