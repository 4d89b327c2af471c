//! # Bank
//!
//! The account and supply primitives the distribution module consumes from
//! the surrounding ledger, plus an in-memory ledger implementing them.
//!
//! Funds always flow the same way:
//!
//! ```text
//! mint(denom, n) → module account ──transfer──→ recipient accounts
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use distro_core::{Address, Amount};

use crate::keys::module_address;

/// Balance type (wide enough for any supply)
pub type Balance = u128;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("insufficient module balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Balance, available: Balance },

    #[error("balance overflow")]
    Overflow,
}

/// Account and supply operations of the surrounding ledger
pub trait Bank {
    /// Funds held by the module account
    fn module_balance(&self, denom: &str) -> Balance;

    /// Circulating supply of `denom`
    fn total_supply(&self, denom: &str) -> Balance;

    /// Mint `amount` into the module account
    fn mint(&self, denom: &str, amount: Amount) -> Result<(), LedgerError>;

    /// Move `amount` from the module account to `recipient`
    fn transfer(&self, denom: &str, recipient: &Address, amount: Amount) -> Result<(), LedgerError>;

    /// Parse an account address
    fn resolve_address(&self, address: &str) -> Result<Address, LedgerError> {
        Address::parse(address).map_err(|_| LedgerError::InvalidAddress(address.to_string()))
    }
}

impl<B: Bank + ?Sized> Bank for &B {
    fn module_balance(&self, denom: &str) -> Balance {
        (**self).module_balance(denom)
    }

    fn total_supply(&self, denom: &str) -> Balance {
        (**self).total_supply(denom)
    }

    fn mint(&self, denom: &str, amount: Amount) -> Result<(), LedgerError> {
        (**self).mint(denom, amount)
    }

    fn transfer(&self, denom: &str, recipient: &Address, amount: Amount) -> Result<(), LedgerError> {
        (**self).transfer(denom, recipient, amount)
    }

    fn resolve_address(&self, address: &str) -> Result<Address, LedgerError> {
        (**self).resolve_address(address)
    }
}

/// Serializable ledger contents
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankState {
    /// Circulating supply per denom
    pub supply: BTreeMap<String, Balance>,
    /// Balances per account, per denom
    pub balances: BTreeMap<Address, BTreeMap<String, Balance>>,
}

/// In-memory ledger
pub struct InMemoryBank {
    state: RwLock<BankState>,
    module: Address,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::from_state(BankState::default())
    }

    pub fn from_state(state: BankState) -> Self {
        Self {
            state: RwLock::new(state),
            module: module_address(),
        }
    }

    /// Copy of the current contents
    pub fn state(&self) -> BankState {
        self.state.read().clone()
    }

    /// Replace the contents wholesale
    pub fn restore(&self, state: BankState) {
        *self.state.write() = state;
    }

    pub fn balance_of(&self, account: &Address, denom: &str) -> Balance {
        self.state
            .read()
            .balances
            .get(account)
            .and_then(|b| b.get(denom))
            .copied()
            .unwrap_or(0)
    }

    /// Credit `account` with newly issued funds (genesis allocations)
    pub fn issue(&self, account: &Address, denom: &str, amount: Balance) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let supply = state.supply.entry(denom.to_string()).or_insert(0);
        *supply = supply.checked_add(amount).ok_or(LedgerError::Overflow)?;
        credit(&mut state, account, denom, amount)
    }
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl Bank for InMemoryBank {
    fn module_balance(&self, denom: &str) -> Balance {
        self.balance_of(&self.module, denom)
    }

    fn total_supply(&self, denom: &str) -> Balance {
        self.state.read().supply.get(denom).copied().unwrap_or(0)
    }

    fn mint(&self, denom: &str, amount: Amount) -> Result<(), LedgerError> {
        self.issue(&self.module, denom, Balance::from(amount))
    }

    fn transfer(&self, denom: &str, recipient: &Address, amount: Amount) -> Result<(), LedgerError> {
        let amount = Balance::from(amount);
        let mut state = self.state.write();

        let available = state
            .balances
            .get(&self.module)
            .and_then(|b| b.get(denom))
            .copied()
            .unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        credit(&mut state, recipient, denom, amount)?;
        if let Some(balance) = state
            .balances
            .get_mut(&self.module)
            .and_then(|b| b.get_mut(denom))
        {
            *balance -= amount;
        }
        Ok(())
    }
}

fn credit(state: &mut BankState, account: &Address, denom: &str, amount: Balance) -> Result<(), LedgerError> {
    let balance = state
        .balances
        .entry(*account)
        .or_default()
        .entry(denom.to_string())
        .or_insert(0);
    *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
    Ok(())
}
