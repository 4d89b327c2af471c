//! # Distro Storage
//!
//! The ledger store adapter used by the distribution module.
//!
//! ## Storage Layout
//!
//! - `distributed/<YYYY-MM-DD>` - cumulative amount released on that date (decimal ASCII)
//! - `nonce/<nonce>` - consumed nonce marker (single `0x01` byte)
//!
//! The module never writes to the store directly while validating: all
//! writes are staged in a `WriteBatch` and applied in one step once a batch
//! is accepted.

pub mod batch;
pub mod error;
pub mod memory;
pub mod pagination;
pub mod prefix;
pub mod store;

pub use batch::WriteBatch;
pub use error::{Result, StorageError};
pub use memory::{MemoryStore, StoreCheckpoint};
pub use pagination::{paginate, PageRequest, PageResponse, PaginationError, DEFAULT_PAGE_LIMIT};
pub use prefix::PrefixStore;
pub use store::KvStore;
