//! Cryptographic error types

use thiserror::Error;

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors in key handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid public key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid secret key
    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// Invalid signature encoding
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Signature verification failed
    #[error("Signature verification failed")]
    VerificationFailed,
}

/// Opaque instruction verification failure
///
/// Malformed signature, malformed key and a failed check all map here so a
/// caller cannot tell which sub-check rejected the instruction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("signature invalid")]
pub struct SignatureInvalid;

impl From<CryptoError> for SignatureInvalid {
    fn from(_: CryptoError) -> Self {
        SignatureInvalid
    }
}
