//! Key management for distribution signers

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use distro_core::{Address, DistributionInstruction, Nonce};

use crate::error::{CryptoError, Result};
use crate::hash::instruction_digest;

/// Parse a hex-encoded Ed25519 public key
pub fn parse_public_key(key_hex: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(key_hex).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len())))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Off-chain key that signs distribution instructions
pub struct InstructionSigner {
    signing_key: SigningKey,
}

impl InstructionSigner {
    /// Generate a new random key
    pub fn generate() -> Self {
        let mut secret_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut secret_bytes);
        let signing_key = SigningKey::from_bytes(&secret_bytes);
        secret_bytes.zeroize();
        Self { signing_key }
    }

    /// Deterministic key from a 32-byte seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Load from a hex-encoded 32-byte secret
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let mut bytes = hex::decode(secret_hex.trim())
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        let seed: std::result::Result<[u8; 32], _> = bytes.as_slice().try_into();
        let len = bytes.len();
        bytes.zeroize();
        let mut seed = seed.map_err(|_| CryptoError::InvalidSecretKey(format!("expected 32 bytes, got {}", len)))?;
        let signer = Self::from_seed(seed);
        seed.zeroize();
        Ok(signer)
    }

    /// Hex-encoded secret, for writing key files
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Hex-encoded public key, the form stored in params
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key().to_bytes())
    }

    /// Account address derived from the public key
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.verifying_key().to_bytes())
    }

    /// Sign the canonical digest of one instruction, hex-encoded
    pub fn sign(&self, date: &str, amount: u64, recipient: &str, nonce: &str) -> String {
        let digest = instruction_digest(date, amount, recipient, nonce);
        hex::encode(self.signing_key.sign(&digest).to_bytes())
    }

    /// Build a fully signed instruction for `recipient`
    pub fn instruction(
        &self,
        date: &str,
        amount: u64,
        recipient: &str,
        nonce: impl Into<Nonce>,
    ) -> DistributionInstruction {
        let nonce = nonce.into();
        let signature = self.sign(date, amount, recipient, nonce.as_str());
        DistributionInstruction {
            date: date.to_string(),
            amount,
            nonce,
            signature,
        }
    }
}
