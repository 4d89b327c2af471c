//! # Distribution Orchestrator
//!
//! Validates and executes one batch in strictly sequential stages:
//!
//! ```text
//! Received → SignerChecked → SupplyChecked → InstructionsVerified → LimitsChecked → Committed
//!     │            │               │                   │                   │
//!     └────────────┴───────────────┴───────────────────┴───────────────────┴──→ Aborted(reason)
//! ```
//!
//! Nothing touches durable state before `LimitsChecked`: nonce markers and
//! daily totals are staged in a `WriteBatch` and applied only once every
//! check has passed. Bank effects of the commit stage rely on the caller's
//! rollback if a later commit step fails.
//!
//! The orchestrator holds no state between calls. Every fact it needs is
//! read from the store and the bank, and "now" is the block time the caller
//! supplies, so re-running a batch against the same state gives the same
//! outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use distro_core::{
    Address, Amount, DistributionBatch, DistributionDate, DistributionError, EmissionParams, Nonce,
    Result,
};
use distro_crypto::DistributionAuthorizer;
use distro_economics::EmissionSchedule;
use distro_storage::{KvStore, WriteBatch};

use crate::bank::{Balance, Bank, LedgerError};
use crate::daily_total::DailyTotalLedger;
use crate::nonce::NonceRegistry;

/// Stages a batch moves through
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DistributionStage {
    Received,
    SignerChecked,
    SupplyChecked,
    InstructionsVerified,
    LimitsChecked,
    Committed,
}

impl DistributionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::SignerChecked => "signer_checked",
            Self::SupplyChecked => "supply_checked",
            Self::InstructionsVerified => "instructions_verified",
            Self::LimitsChecked => "limits_checked",
            Self::Committed => "committed",
        }
    }
}

impl fmt::Display for DistributionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment of one batch execution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub height: u64,
    /// Fixed for the whole batch
    pub time: DateTime<Utc>,
}

impl BlockContext {
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// Latest date an instruction may carry
    pub fn date(&self) -> DistributionDate {
        DistributionDate::from_datetime(self.time)
    }
}

/// What an accepted batch changed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReceipt {
    pub height: u64,
    /// Declared batch total
    pub amount: Amount,
    /// Newly minted shortfall
    pub minted: Amount,
    /// Aggregated transfers in recipient order
    pub transfers: Vec<(Address, Amount)>,
    /// Daily totals after the batch, for every date it touched
    pub daily_totals: BTreeMap<DistributionDate, Amount>,
    pub nonces_consumed: usize,
}

/// Result of the verification stage
struct VerifiedInstructions {
    per_date: BTreeMap<DistributionDate, Amount>,
    transfers: Vec<(Address, Amount)>,
    nonces: Vec<Nonce>,
}

impl From<LedgerError> for DistributionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidAddress(address) => DistributionError::InvalidAddress { address },
            // accounting faults (balance, overflow) have no variant of their
            // own; they abort the batch as a fatal failure tagged as a ledger fault
            other => DistributionError::StorageFailure(format!("ledger fault: {}", other)),
        }
    }
}

/// Batch distribution orchestrator
pub struct Distributor<'a, S: KvStore + ?Sized, B: Bank + ?Sized> {
    store: &'a S,
    bank: &'a B,
    params: &'a EmissionParams,
    authorizer: DistributionAuthorizer<'a>,
    schedule: EmissionSchedule,
}

impl<'a, S: KvStore + ?Sized, B: Bank + ?Sized> Distributor<'a, S, B> {
    pub fn new(store: &'a S, bank: &'a B, params: &'a EmissionParams) -> Self {
        Self {
            store,
            bank,
            params,
            authorizer: DistributionAuthorizer::new(params),
            schedule: EmissionSchedule::from_params(params),
        }
    }

    pub fn params(&self) -> &EmissionParams {
        self.params
    }

    /// Validate and execute `batch`; all or nothing
    pub fn distribute(&self, batch: &DistributionBatch, ctx: &BlockContext) -> Result<DistributionReceipt> {
        let mut stage = DistributionStage::Received;
        match self.execute(batch, ctx, &mut stage) {
            Ok(receipt) => {
                tracing::info!(
                    height = ctx.height,
                    signer = %batch.signer,
                    amount = receipt.amount,
                    minted = receipt.minted,
                    recipients = receipt.transfers.len(),
                    nonces = receipt.nonces_consumed,
                    "distribution committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(
                    height = ctx.height,
                    signer = %batch.signer,
                    stage = %stage,
                    kind = e.kind(),
                    error = %e,
                    "distribution rejected"
                );
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        batch: &DistributionBatch,
        ctx: &BlockContext,
        stage: &mut DistributionStage,
    ) -> Result<DistributionReceipt> {
        batch.validate_basic()?;

        if !self.authorizer.is_authorized(&batch.signer) {
            return Err(DistributionError::Unauthorized {
                signer: batch.signer.clone(),
            });
        }
        advance(stage, DistributionStage::SignerChecked);

        self.check_supply(batch.amount)?;
        advance(stage, DistributionStage::SupplyChecked);

        let verified = self.verify_instructions(batch, &ctx.date())?;
        advance(stage, DistributionStage::InstructionsVerified);

        let mut writes = WriteBatch::new();
        let daily_totals = self.check_limits(&verified.per_date, &mut writes)?;
        advance(stage, DistributionStage::LimitsChecked);

        let minted = self.commit(batch.amount, &verified, writes)?;
        advance(stage, DistributionStage::Committed);

        Ok(DistributionReceipt {
            height: ctx.height,
            amount: batch.amount,
            minted,
            transfers: verified.transfers,
            daily_totals,
            nonces_consumed: verified.nonces.len(),
        })
    }

    fn check_supply(&self, requested: Amount) -> Result<()> {
        let current = self.bank.total_supply(&self.params.denom);
        if current.saturating_add(Balance::from(requested)) > Balance::from(self.params.max_supply) {
            return Err(DistributionError::SupplyExceeded {
                current,
                requested,
                max: self.params.max_supply,
            });
        }
        Ok(())
    }

    fn verify_instructions(
        &self,
        batch: &DistributionBatch,
        block_date: &DistributionDate,
    ) -> Result<VerifiedInstructions> {
        let start = self.params.distribution_start_date;
        let nonces_store = NonceRegistry::new(self.store);

        let mut pending: BTreeSet<&str> = BTreeSet::new();
        let mut verified = VerifiedInstructions {
            per_date: BTreeMap::new(),
            transfers: Vec::new(),
            nonces: Vec::new(),
        };
        let overflow = || DistributionError::AmountMismatch {
            declared: batch.amount,
            computed: None,
        };

        for recipient in &batch.recipients {
            let address = self.bank.resolve_address(&recipient.address)?;

            for instruction in &recipient.distributions {
                let date = DistributionDate::parse(&instruction.date).map_err(|e| {
                    DistributionError::InvalidDate {
                        date: instruction.date.clone(),
                        reason: e.to_string(),
                    }
                })?;
                if date < start {
                    return Err(DistributionError::InvalidDate {
                        date: instruction.date.clone(),
                        reason: format!("before distribution start date {}", start),
                    });
                }
                if date > *block_date {
                    return Err(DistributionError::InvalidDate {
                        date: instruction.date.clone(),
                        reason: format!("after block date {}", block_date),
                    });
                }

                let nonce = &instruction.nonce;
                if !pending.insert(nonce.as_str()) || nonces_store.has_been_used(nonce)? {
                    return Err(DistributionError::NonceReused {
                        nonce: nonce.to_string(),
                    });
                }

                if self
                    .authorizer
                    .verify_instruction(instruction, &recipient.address)
                    .is_err()
                {
                    tracing::debug!(%nonce, recipient = %recipient.address, "instruction signature rejected");
                    return Err(DistributionError::SignatureInvalid {
                        nonce: nonce.to_string(),
                    });
                }

                let day_total = verified.per_date.entry(date).or_insert(0);
                *day_total = day_total.checked_add(instruction.amount).ok_or_else(overflow)?;

                match verified.transfers.iter_mut().find(|(a, _)| *a == address) {
                    Some((_, owed)) => {
                        *owed = owed.checked_add(instruction.amount).ok_or_else(overflow)?;
                    }
                    None => verified.transfers.push((address, instruction.amount)),
                }
                verified.nonces.push(nonce.clone());
            }
        }

        Ok(verified)
    }

    fn check_limits(
        &self,
        per_date: &BTreeMap<DistributionDate, Amount>,
        writes: &mut WriteBatch,
    ) -> Result<BTreeMap<DistributionDate, Amount>> {
        let ledger = DailyTotalLedger::new(self.store);
        let mut totals = BTreeMap::new();

        for (date, requested) in per_date {
            let already = ledger.get(date)?.unwrap_or(0);
            let limit = self.schedule.daily_limit(date);
            let total = already.checked_add(*requested).filter(|t| *t <= limit);

            let Some(total) = total else {
                return Err(DistributionError::DailyLimitExceeded {
                    date: date.to_string(),
                    already,
                    requested: *requested,
                    limit,
                });
            };
            tracing::debug!(%date, already, requested, limit, "daily limit checked");

            ledger.stage_set(writes, date, total);
            totals.insert(*date, total);
        }

        Ok(totals)
    }

    fn commit(&self, amount: Amount, verified: &VerifiedInstructions, mut writes: WriteBatch) -> Result<Amount> {
        let denom = &self.params.denom;

        let balance = self.bank.module_balance(denom);
        let needed = Balance::from(amount);
        let minted = if balance < needed {
            // shortfall <= amount, so it fits
            let shortfall = Amount::try_from(needed - balance)
                .map_err(|e| DistributionError::StorageFailure(e.to_string()))?;
            self.bank.mint(denom, shortfall)?;
            tracing::debug!(denom = %denom, shortfall, "minted module shortfall");
            shortfall
        } else {
            0
        };

        for (address, owed) in &verified.transfers {
            if *owed == 0 {
                continue;
            }
            self.bank.transfer(denom, address, *owed)?;
        }

        let registry = NonceRegistry::new(self.store);
        for nonce in &verified.nonces {
            registry.stage_mark_used(&mut writes, nonce);
        }
        self.store.apply(writes)?;

        Ok(minted)
    }
}

fn advance(stage: &mut DistributionStage, next: DistributionStage) {
    tracing::debug!(from = %stage, to = %next, "distribution stage");
    *stage = next;
}
