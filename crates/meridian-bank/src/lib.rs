//! # meridian-bank
//!
//! Store-backed token balances between named accounts.
//!
//! Balances live under `bank/balance/{account}/{denom}` and the total supply
//! of each denomination under `bank/supply/{denom}`. Values are CBOR-encoded
//! `u128` amounts; zero balances are deleted rather than stored.
//!
//! [`Bank`] is the write handle. It checks every leg of a transfer before
//! writing anything, so a failed call leaves the store as it was.

use meridian_store::{codec, KvStore, StoreError};
use meridian_types::{AccountId, Coin, Coins};

/// Bank error types.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("insufficient funds: {account} has {available}{denom}, needs {required}{denom}")]
    InsufficientFunds {
        account: AccountId,
        denom: String,
        required: u128,
        available: u128,
    },

    #[error("amount overflow for {0}")]
    Overflow(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, BankError>;

const BALANCE_PREFIX: &str = "bank/balance/";
const SUPPLY_PREFIX: &str = "bank/supply/";

fn balance_key(account: &AccountId, denom: &str) -> String {
    format!("{BALANCE_PREFIX}{account}/{denom}")
}

fn supply_key(denom: &str) -> String {
    format!("{SUPPLY_PREFIX}{denom}")
}

/// Balance of `denom` held by `account`.
pub fn balance(store: &dyn KvStore, account: &AccountId, denom: &str) -> Result<u128> {
    Ok(codec::get(store, &balance_key(account, denom))?.unwrap_or(0))
}

/// Every non-zero balance held by `account`.
pub fn all_balances(store: &dyn KvStore, account: &AccountId) -> Result<Coins> {
    let prefix = format!("{BALANCE_PREFIX}{account}/");
    let entries: Vec<(String, u128)> = codec::scan(store, &prefix)?;
    let coins = entries.into_iter().filter_map(|(key, amount)| {
        key.strip_prefix(&prefix)
            .map(|denom| Coin::new(denom, amount))
    });
    Coins::new(coins).ok_or_else(|| BankError::Overflow(account.to_string()))
}

/// Total minted minus burned for `denom`.
pub fn supply(store: &dyn KvStore, denom: &str) -> Result<u128> {
    Ok(codec::get(store, &supply_key(denom))?.unwrap_or(0))
}

/// Write handle over a store.
pub struct Bank<'a> {
    store: &'a mut dyn KvStore,
}

impl<'a> Bank<'a> {
    pub fn new(store: &'a mut dyn KvStore) -> Self {
        Self { store }
    }

    pub fn balance(&self, account: &AccountId, denom: &str) -> Result<u128> {
        balance(&*self.store, account, denom)
    }

    /// Move `coins` from one account to another.
    pub fn send(&mut self, from: &AccountId, to: &AccountId, coins: &Coins) -> Result<()> {
        self.ensure_funds(from, coins)?;
        for coin in coins.iter() {
            self.sub_balance(from, coin)?;
            self.add_balance(to, coin)?;
        }
        tracing::trace!(%from, %to, %coins, "bank: send");
        Ok(())
    }

    /// Create `coins` in `to`, increasing supply.
    pub fn mint(&mut self, to: &AccountId, coins: &Coins) -> Result<()> {
        for coin in coins.iter() {
            let current = supply(&*self.store, &coin.denom)?;
            let next = current
                .checked_add(coin.amount)
                .ok_or_else(|| BankError::Overflow(coin.denom.clone()))?;
            self.add_balance(to, coin)?;
            self.write_supply(&coin.denom, next)?;
        }
        tracing::trace!(%to, %coins, "bank: mint");
        Ok(())
    }

    /// Destroy `coins` held by `from`, decreasing supply.
    pub fn burn(&mut self, from: &AccountId, coins: &Coins) -> Result<()> {
        self.ensure_funds(from, coins)?;
        for coin in coins.iter() {
            let current = supply(&*self.store, &coin.denom)?;
            self.sub_balance(from, coin)?;
            self.write_supply(&coin.denom, current.saturating_sub(coin.amount))?;
        }
        tracing::trace!(%from, %coins, "bank: burn");
        Ok(())
    }

    fn ensure_funds(&self, account: &AccountId, coins: &Coins) -> Result<()> {
        for coin in coins.iter() {
            let available = self.balance(account, &coin.denom)?;
            if available < coin.amount {
                return Err(BankError::InsufficientFunds {
                    account: account.clone(),
                    denom: coin.denom.clone(),
                    required: coin.amount,
                    available,
                });
            }
        }
        Ok(())
    }

    fn add_balance(&mut self, account: &AccountId, coin: &Coin) -> Result<()> {
        let current = self.balance(account, &coin.denom)?;
        let next = current
            .checked_add(coin.amount)
            .ok_or_else(|| BankError::Overflow(coin.denom.clone()))?;
        self.write_balance(account, &coin.denom, next)
    }

    fn sub_balance(&mut self, account: &AccountId, coin: &Coin) -> Result<()> {
        let available = self.balance(account, &coin.denom)?;
        let next = available
            .checked_sub(coin.amount)
            .ok_or_else(|| BankError::InsufficientFunds {
                account: account.clone(),
                denom: coin.denom.clone(),
                required: coin.amount,
                available,
            })?;
        self.write_balance(account, &coin.denom, next)
    }

    fn write_balance(&mut self, account: &AccountId, denom: &str, amount: u128) -> Result<()> {
        let key = balance_key(account, denom);
        if amount == 0 {
            self.store.delete(key.as_bytes())?;
        } else {
            codec::put(self.store, &key, &amount)?;
        }
        Ok(())
    }

    fn write_supply(&mut self, denom: &str, amount: u128) -> Result<()> {
        let key = supply_key(denom);
        if amount == 0 {
            self.store.delete(key.as_bytes())?;
        } else {
            codec::put(self.store, &key, &amount)?;
        }
        Ok(())
    }
}
