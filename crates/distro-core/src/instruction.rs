//! Distribution requests
//!
//! Wire-level shapes of a batch. Dates and addresses stay as the strings the
//! signer supplied; the orchestrator parses them in its verification stage
//! so a malformed value is reported against the instruction that carried it.

use serde::{Deserialize, Serialize};

use crate::error::DistributionError;
use crate::types::{Amount, Nonce};

/// One dated release owed to one recipient
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionInstruction {
    /// Calendar date (`YYYY-MM-DD`), the rate-limit bucket
    pub date: String,
    /// Amount in smallest denomination units
    pub amount: Amount,
    /// Single-use token, scoped to the module's lifetime
    pub nonce: Nonce,
    /// Hex-encoded detached signature over the canonical payload
    pub signature: String,
}

/// An account plus the instructions owed to it in one batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Canonical account address
    pub address: String,
    /// Ordered instructions
    pub distributions: Vec<DistributionInstruction>,
}

impl Recipient {
    /// Sum of this recipient's instruction amounts; `None` on overflow
    pub fn total(&self) -> Option<Amount> {
        self.distributions
            .iter()
            .try_fold(0u64, |acc, d| acc.checked_add(d.amount))
    }
}

/// A batch distribution request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionBatch {
    /// Claimed signer address
    pub signer: String,
    /// Declared total across all instructions
    pub amount: Amount,
    /// Ordered recipients
    pub recipients: Vec<Recipient>,
}

impl DistributionBatch {
    pub fn new(signer: impl Into<String>, amount: Amount, recipients: Vec<Recipient>) -> Self {
        Self {
            signer: signer.into(),
            amount,
            recipients,
        }
    }

    /// Iterate instructions in recipient order, then instruction order
    pub fn instructions(&self) -> impl Iterator<Item = (&Recipient, &DistributionInstruction)> {
        self.recipients
            .iter()
            .flat_map(|r| r.distributions.iter().map(move |d| (r, d)))
    }

    pub fn instruction_count(&self) -> usize {
        self.recipients.iter().map(|r| r.distributions.len()).sum()
    }

    /// Sum of all instruction amounts; `None` on overflow
    pub fn instruction_total(&self) -> Option<Amount> {
        self.instructions()
            .try_fold(0u64, |acc, (_, d)| acc.checked_add(d.amount))
    }

    /// Stateless checks run before any store access
    ///
    /// The amount check comes first so a mismatched batch is always reported
    /// as `AmountMismatch`, whatever else is wrong with it.
    pub fn validate_basic(&self) -> Result<(), DistributionError> {
        let computed = self.instruction_total();
        if computed != Some(self.amount) {
            return Err(DistributionError::AmountMismatch {
                declared: self.amount,
                computed,
            });
        }

        if self.amount == 0 {
            return Err(DistributionError::InvalidRequest(
                "amount cannot be zero".to_string(),
            ));
        }

        if self.recipients.is_empty() {
            return Err(DistributionError::InvalidRequest(
                "recipients cannot be empty".to_string(),
            ));
        }

        if self.instructions().any(|(_, d)| d.nonce.is_empty()) {
            return Err(DistributionError::InvalidRequest(
                "nonce cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
