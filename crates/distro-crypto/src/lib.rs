//! # Distro Cryptography
//!
//! Cryptographic primitives for the distro module:
//! - Canonical, length-prefixed instruction payloads
//! - BLAKE3 digests of those payloads
//! - Ed25519 instruction signing and verification
//! - Signer authorization against the parameter snapshot
//!
//! | Function | Algorithm | Notes |
//! |----------|-----------|-------|
//! | Payload digest | BLAKE3 | 256-bit |
//! | Signatures | Ed25519 | strict verification |
//! | Addresses | BLAKE3(public key) | `0x` + 64 hex |

pub mod authorizer;
pub mod error;
pub mod hash;
pub mod keys;

pub use authorizer::*;
pub use error::*;
pub use hash::*;
pub use keys::*;

/// Cryptographic prelude
pub mod prelude {
    pub use crate::authorizer::{is_authorized, verify_instruction, DistributionAuthorizer};
    pub use crate::error::{CryptoError, Result, SignatureInvalid};
    pub use crate::hash::{instruction_digest, instruction_payload};
    pub use crate::keys::{parse_public_key, InstructionSigner};
}
