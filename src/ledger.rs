//! Wallet ledger: atomic per-user balance adjustments.
//!
//! Every money-moving operation in the engine goes through this ledger.
//! Balances are non-negative; a debit that would overdraw fails whole and
//! leaves the balance untouched. Mutations happen inside the concurrent
//! map's entry guard, so concurrent debits and credits against the same
//! user serialize, including credits arriving from other subsystems.

use dashmap::DashMap;
use tracing::debug;

use crate::errors::{GameError, GameResult};
use crate::users::UserId;

/// In-memory ledger keyed by user. Production deployments put the relational
/// store behind the same operations.
#[derive(Debug, Default)]
pub struct WalletLedger {
    balances: DashMap<UserId, u64>,
}

impl WalletLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with an opening balance. Returns false when the
    /// account already exists (the existing balance is kept).
    pub fn open_account(&self, user: UserId, opening_balance: u64) -> bool {
        match self.balances.entry(user) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(opening_balance);
                true
            }
        }
    }

    /// Drop an account, returning its final balance.
    pub fn close_account(&self, user: UserId) -> Option<u64> {
        self.balances.remove(&user).map(|(_, balance)| balance)
    }

    pub fn balance(&self, user: UserId) -> GameResult<u64> {
        self.balances
            .get(&user)
            .map(|b| *b)
            .ok_or(GameError::UserNotFound(user))
    }

    /// Debit `amount`, failing with `InsufficientFunds` before any change
    /// when the balance cannot cover it. Returns the new balance.
    pub fn try_debit(&self, user: UserId, amount: u64) -> GameResult<u64> {
        let mut entry = self
            .balances
            .get_mut(&user)
            .ok_or(GameError::UserNotFound(user))?;

        if *entry < amount {
            return Err(GameError::InsufficientFunds {
                balance: *entry,
                required: amount,
            });
        }

        *entry -= amount;
        debug!(user, amount, balance = *entry, "ledger debit");
        Ok(*entry)
    }

    /// Credit `amount`, returning the new balance.
    pub fn credit(&self, user: UserId, amount: u64) -> GameResult<u64> {
        let mut entry = self
            .balances
            .get_mut(&user)
            .ok_or(GameError::UserNotFound(user))?;

        *entry = entry.saturating_add(amount);
        debug!(user, amount, balance = *entry, "ledger credit");
        Ok(*entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn debit_and_credit_round_trip() {
        let ledger = WalletLedger::new();
        assert!(ledger.open_account(1, 100));
        assert_eq!(ledger.try_debit(1, 50), Ok(50));
        assert_eq!(ledger.credit(1, 98), Ok(148));
        assert_eq!(ledger.balance(1), Ok(148));
    }

    #[test]
    fn overdraw_fails_without_partial_effect() {
        let ledger = WalletLedger::new();
        ledger.open_account(1, 30);
        assert_eq!(
            ledger.try_debit(1, 50),
            Err(GameError::InsufficientFunds {
                balance: 30,
                required: 50,
            })
        );
        assert_eq!(ledger.balance(1), Ok(30));
    }

    #[test]
    fn unknown_user_is_rejected() {
        let ledger = WalletLedger::new();
        assert_eq!(ledger.try_debit(9, 1), Err(GameError::UserNotFound(9)));
        assert_eq!(ledger.credit(9, 1), Err(GameError::UserNotFound(9)));
    }

    #[test]
    fn reopening_an_account_keeps_the_existing_balance() {
        let ledger = WalletLedger::new();
        assert!(ledger.open_account(1, 10));
        assert!(!ledger.open_account(1, 999));
        assert_eq!(ledger.balance(1), Ok(10));
    }

    #[test]
    fn concurrent_debits_never_oversubscribe() {
        let ledger = Arc::new(WalletLedger::new());
        ledger.open_account(1, 100);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    let mut won = 0u64;
                    for _ in 0..100 {
                        if ledger.try_debit(1, 1).is_ok() {
                            won += 1;
                        }
                    }
                    won
                })
            })
            .collect();

        let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100);
        assert_eq!(ledger.balance(1), Ok(0));
    }
}
