//! Core type definitions for the distro module
//!
//! Addresses, amounts and nonces as they appear on the wire and in the store.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Amount in the smallest denomination unit
pub type Amount = u64;

/// Address - canonical 32-byte account identifier
///
/// Canonical text form is `0x` followed by 64 lowercase hex characters.
/// Authorization checks compare this canonical form byte for byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address {
    bytes: [u8; 32],
}

/// Reasons an address string is rejected
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("missing 0x prefix")]
    MissingPrefix,

    #[error("expected 64 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex encoding")]
    InvalidHex,

    #[error("address is not in canonical lowercase form")]
    NotCanonical,
}

impl Address {
    /// Text prefix of every canonical address
    pub const PREFIX: &'static str = "0x";

    /// Create from raw bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Derive an address from a public key (BLAKE3 of the key bytes)
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Self {
            bytes: *blake3::hash(public_key).as_bytes(),
        }
    }

    /// Parse the canonical text form, rejecting anything else
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let body = s.strip_prefix(Self::PREFIX).ok_or(AddressError::MissingPrefix)?;
        if body.len() != 64 {
            return Err(AddressError::InvalidLength(body.len()));
        }
        let decoded = hex::decode(body).map_err(|_| AddressError::InvalidHex)?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);

        let address = Self { bytes };
        if address.to_canonical() != s {
            return Err(AddressError::NotCanonical);
        }
        Ok(address)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Canonical text form
    pub fn to_canonical(&self) -> String {
        format!("{}{}", Self::PREFIX, hex::encode(self.bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}..)", &self.to_canonical()[..12])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

/// Nonce - single-use authorization token
///
/// Opaque to the module. Integer nonces are accepted on the wire and kept in
/// their decimal form so the store key and the signed payload agree.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Nonce(String);

impl Nonce {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<u64> for Nonce {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for Nonce {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Nonce {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.0)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NonceVisitor;

        impl<'de> Visitor<'de> for NonceVisitor {
            type Value = Nonce;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a nonce string or unsigned integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Nonce, E> {
                Ok(Nonce(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Nonce, E> {
                Ok(Nonce(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Nonce, E> {
                Ok(Nonce::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Nonce, E> {
                u64::try_from(v)
                    .map(Nonce::from)
                    .map_err(|_| E::custom("nonce must not be negative"))
            }
        }

        deserializer.deserialize_any(NonceVisitor)
    }
}
