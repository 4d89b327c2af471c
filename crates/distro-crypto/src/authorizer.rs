//! Distribution authorizer
//!
//! Two checks guard every batch:
//! - the claimed signer must be in the authorized account set
//! - every instruction must carry a valid signature from the configured key
//!
//! Signature failures are deliberately opaque: a bad hex string, a bad key
//! and a failed check are indistinguishable to the caller.

use ed25519_dalek::{Signature, VerifyingKey};

use distro_core::{DistributionInstruction, EmissionParams};

use crate::error::{CryptoError, SignatureInvalid};
use crate::hash::instruction_digest;
use crate::keys::parse_public_key;

/// Set membership on the canonical address string
pub fn is_authorized(signer: &str, params: &EmissionParams) -> bool {
    params.authorized_accounts.contains(signer)
}

/// Verify one instruction owed to `recipient` against `public_key`
pub fn verify_instruction(
    instruction: &DistributionInstruction,
    recipient: &str,
    public_key: &VerifyingKey,
) -> Result<(), SignatureInvalid> {
    let signature = decode_signature(&instruction.signature)?;
    let digest = instruction_digest(
        &instruction.date,
        instruction.amount,
        recipient,
        instruction.nonce.as_str(),
    );
    public_key
        .verify_strict(&digest, &signature)
        .map_err(|_| CryptoError::VerificationFailed)?;
    Ok(())
}

fn decode_signature(signature_hex: &str) -> Result<Signature, CryptoError> {
    let bytes = hex::decode(signature_hex).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    Signature::from_slice(&bytes).map_err(|e| CryptoError::InvalidSignature(e.to_string()))
}

/// Authorizer bound to one parameter snapshot
///
/// The configured key is parsed once. A missing or malformed key makes every
/// instruction fail verification.
pub struct DistributionAuthorizer<'a> {
    params: &'a EmissionParams,
    verifying_key: Option<VerifyingKey>,
}

impl<'a> DistributionAuthorizer<'a> {
    pub fn new(params: &'a EmissionParams) -> Self {
        let verifying_key = match parse_public_key(&params.distribution_signer_public_key) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::debug!(error = %e, "distribution signer key unusable");
                None
            }
        };
        Self {
            params,
            verifying_key,
        }
    }

    pub fn is_authorized(&self, signer: &str) -> bool {
        is_authorized(signer, self.params)
    }

    pub fn verify_instruction(
        &self,
        instruction: &DistributionInstruction,
        recipient: &str,
    ) -> Result<(), SignatureInvalid> {
        let key = self.verifying_key.as_ref().ok_or(SignatureInvalid)?;
        verify_instruction(instruction, recipient, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::InstructionSigner;
    use distro_core::Address;

    const RECIPIENT: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    fn params_for(signer: &InstructionSigner) -> EmissionParams {
        EmissionParams::default()
            .with_authorized_accounts(vec![Address::new([7u8; 32]).to_canonical()])
            .with_signer_public_key(signer.public_key_hex())
    }

    #[test]
    fn test_is_authorized_exact_match() {
        let signer = InstructionSigner::from_seed([1u8; 32]);
        let params = params_for(&signer);
        let allowed = Address::new([7u8; 32]).to_canonical();

        assert!(is_authorized(&allowed, &params));
        assert!(!is_authorized(&allowed.to_uppercase(), &params));
        assert!(!is_authorized(&Address::new([8u8; 32]).to_canonical(), &params));
    }

    #[test]
    fn test_valid_signature_verifies() {
        let signer = InstructionSigner::from_seed([1u8; 32]);
        let params = params_for(&signer);
        let authorizer = DistributionAuthorizer::new(&params);

        let instruction = signer.instruction("2025-03-01", 500, RECIPIENT, 1u64);
        assert_eq!(authorizer.verify_instruction(&instruction, RECIPIENT), Ok(()));
    }

    #[test]
    fn test_tampered_fields_rejected() {
        let signer = InstructionSigner::from_seed([1u8; 32]);
        let params = params_for(&signer);
        let authorizer = DistributionAuthorizer::new(&params);
        let instruction = signer.instruction("2025-03-01", 500, RECIPIENT, 1u64);

        let mut tampered = instruction.clone();
        tampered.amount = 501;
        assert_eq!(authorizer.verify_instruction(&tampered, RECIPIENT), Err(SignatureInvalid));

        let mut tampered = instruction.clone();
        tampered.date = "2025-03-02".to_string();
        assert_eq!(authorizer.verify_instruction(&tampered, RECIPIENT), Err(SignatureInvalid));

        let other = Address::new([2u8; 32]).to_canonical();
        assert_eq!(authorizer.verify_instruction(&instruction, &other), Err(SignatureInvalid));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let signer = InstructionSigner::from_seed([1u8; 32]);
        let params = params_for(&signer);
        let authorizer = DistributionAuthorizer::new(&params);

        let mut instruction = signer.instruction("2025-03-01", 500, RECIPIENT, 1u64);
        instruction.signature = "not-hex".to_string();
        assert_eq!(authorizer.verify_instruction(&instruction, RECIPIENT), Err(SignatureInvalid));

        instruction.signature = "abcd".to_string();
        assert_eq!(authorizer.verify_instruction(&instruction, RECIPIENT), Err(SignatureInvalid));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = InstructionSigner::from_seed([1u8; 32]);
        let impostor = InstructionSigner::from_seed([2u8; 32]);
        let params = params_for(&signer);
        let authorizer = DistributionAuthorizer::new(&params);

        let instruction = impostor.instruction("2025-03-01", 500, RECIPIENT, 1u64);
        assert_eq!(authorizer.verify_instruction(&instruction, RECIPIENT), Err(SignatureInvalid));
    }

    #[test]
    fn test_missing_key_rejects_everything() {
        let signer = InstructionSigner::from_seed([1u8; 32]);
        let params = params_for(&signer).with_signer_public_key("");
        let authorizer = DistributionAuthorizer::new(&params);

        let instruction = signer.instruction("2025-03-01", 500, RECIPIENT, 1u64);
        assert_eq!(authorizer.verify_instruction(&instruction, RECIPIENT), Err(SignatureInvalid));
    }
}
