//! # Distro Core
//!
//! Shared data model for the distro emission module.
//!
//! This crate provides the types every other crate speaks:
//! - `DistributionBatch` - One signed request releasing funds to recipients
//! - `Recipient` / `DistributionInstruction` - Dated, nonce-tagged releases
//! - `DistributionDate` - Canonical `YYYY-MM-DD` calendar day (rate-limit bucket)
//! - `Address` - Canonical 32-byte account address
//! - `EmissionParams` - Immutable parameter snapshot passed into every call
//! - `DistributionError` - The rejection taxonomy of the orchestrator
//!
//! ## Batch Shape
//!
//! ```text
//!  DistributionBatch { signer, amount }
//!     ├── Recipient 0x1f..  ─┬─ (2025-03-01, 500, nonce "17", sig)
//!     │                      └─ (2025-03-02, 250, nonce "18", sig)
//!     └── Recipient 0xa4..  ─── (2025-03-01, 750, nonce "19", sig)
//! ```

pub mod date;
pub mod error;
pub mod instruction;
pub mod params;
pub mod types;

pub use date::*;
pub use error::*;
pub use instruction::*;
pub use params::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::date::DistributionDate;
    pub use crate::error::{DistributionError, ParamsError, Result};
    pub use crate::instruction::{DistributionBatch, DistributionInstruction, Recipient};
    pub use crate::params::EmissionParams;
    pub use crate::types::*;
}
