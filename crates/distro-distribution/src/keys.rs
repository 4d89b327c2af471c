//! Store layout of the distribution module

use distro_core::{Address, DistributionDate, Nonce};

/// Module name, also the seed of the module account address
pub const MODULE_NAME: &str = "distribute";

/// Namespace of per-date cumulative totals
pub const DAILY_TOTAL_PREFIX: &[u8] = b"distributed/";

/// Namespace of consumed nonces
pub const NONCE_PREFIX: &[u8] = b"nonce/";

/// Value stored under every consumed nonce
pub const NONCE_MARKER: &[u8] = &[0x01];

/// Key of the daily total for `date` inside its namespace
pub fn daily_total_key(date: &DistributionDate) -> Vec<u8> {
    date.to_string().into_bytes()
}

/// Key of `nonce` inside its namespace
pub fn nonce_key(nonce: &Nonce) -> Vec<u8> {
    nonce.as_bytes().to_vec()
}

/// Account that receives minted funds before they are transferred out
pub fn module_address() -> Address {
    Address::from_public_key(MODULE_NAME.as_bytes())
}
