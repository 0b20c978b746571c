// chain-core/src/account.rs

use crate::{types::Amount, Address, ChainError, ChainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account ledger capability: balance lookup and atomic transfer.
///
/// Checkpoints nest; `commit` and `rollback` resolve the most recent open
/// checkpoint. Callers that mutate balances inside a transaction are
/// expected to bracket the mutation with a checkpoint so a mid-sequence
/// failure can be undone.
pub trait Ledger {
    /// Current spendable balance of `address` (zero for unknown accounts)
    fn balance(&self, address: &Address) -> Amount;

    /// Move `amount` from one account to another. Atomic per call: either
    /// both sides change or neither does.
    fn transfer(&mut self, from: &Address, to: &Address, amount: &Amount) -> ChainResult<()>;

    /// Open a rollback point
    fn checkpoint(&mut self);

    /// Discard the most recent rollback point, keeping changes
    fn commit(&mut self);

    /// Restore balances to the most recent rollback point
    fn rollback(&mut self);
}

/// In-memory account ledger with journaled rollback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLedger {
    balances: BTreeMap<Address, Amount>,
    journal: Vec<JournalEntry>,
}

/// Journal entry recording the pre-image of a balance write
#[derive(Debug, Clone, Serialize, Deserialize)]
enum JournalEntry {
    Checkpoint,
    BalanceSet {
        address: Address,
        old_balance: Option<Amount>,
    },
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account directly, bypassing transfer semantics. Genesis
    /// funding and test setup only.
    pub fn credit(&mut self, address: Address, amount: &Amount) {
        let balance = Amount::new(self.balance(&address).inner() + amount.inner());
        self.set_balance(address, balance);
    }

    fn set_balance(&mut self, address: Address, balance: Amount) {
        self.record_balance_modification(address);
        self.balances.insert(address, balance);
    }

    /// Record the original balance of `address` unless one has already been
    /// recorded since the last checkpoint, so rollback restores the
    /// pre-checkpoint value.
    fn record_balance_modification(&mut self, address: Address) {
        for entry in self.journal.iter().rev() {
            match entry {
                JournalEntry::Checkpoint => break,
                JournalEntry::BalanceSet { address: a, .. } if *a == address => {
                    // already recorded for this checkpoint
                    return;
                }
                _ => {}
            }
        }

        let old = self.balances.get(&address).cloned();
        self.journal.push(JournalEntry::BalanceSet {
            address,
            old_balance: old,
        });
    }
}

impl Ledger for MemoryLedger {
    fn balance(&self, address: &Address) -> Amount {
        self.balances
            .get(address)
            .cloned()
            .unwrap_or_else(Amount::zero)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: &Amount) -> ChainResult<()> {
        let from_balance = self.balance(from);
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or(ChainError::InsufficientBalance)?;
        let new_to = Amount::new(self.balance(to).inner() + amount.inner());

        self.set_balance(*from, new_from);
        self.set_balance(*to, new_to);

        tracing::trace!(%from, %to, %amount, "ledger transfer");
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.journal.push(JournalEntry::Checkpoint);
    }

    fn commit(&mut self) {
        // drop only the checkpoint marker; the pre-images stay in the
        // journal so an enclosing checkpoint can still roll them back
        if let Some(pos) = self
            .journal
            .iter()
            .rposition(|entry| matches!(entry, JournalEntry::Checkpoint))
        {
            self.journal.remove(pos);
        }
    }

    fn rollback(&mut self) {
        while let Some(entry) = self.journal.pop() {
            match entry {
                JournalEntry::Checkpoint => break,
                JournalEntry::BalanceSet {
                    address,
                    old_balance,
                } => {
                    if let Some(old) = old_balance {
                        self.balances.insert(address, old);
                    } else {
                        self.balances.remove(&address);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = tag;
        Address::new(bytes)
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(addr(1), &Amount::from_u64(1000));

        ledger
            .transfer(&addr(1), &addr(2), &Amount::from_u64(300))
            .unwrap();

        assert_eq!(ledger.balance(&addr(1)), Amount::from_u64(700));
        assert_eq!(ledger.balance(&addr(2)), Amount::from_u64(300));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(addr(1), &Amount::from_u64(10));

        let err = ledger
            .transfer(&addr(1), &addr(2), &Amount::from_u64(11))
            .unwrap_err();
        assert!(matches!(err, ChainError::InsufficientBalance));

        // nothing moved
        assert_eq!(ledger.balance(&addr(1)), Amount::from_u64(10));
        assert!(ledger.balance(&addr(2)).is_zero());
    }

    #[test]
    fn test_rollback_restores_balances() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(addr(1), &Amount::from_u64(500));

        ledger.checkpoint();
        ledger
            .transfer(&addr(1), &addr(2), &Amount::from_u64(200))
            .unwrap();
        ledger.rollback();

        assert_eq!(ledger.balance(&addr(1)), Amount::from_u64(500));
        assert!(ledger.balance(&addr(2)).is_zero());
    }

    #[test]
    fn test_rollback_removes_accounts_created_after_checkpoint() {
        let mut ledger = MemoryLedger::new();
        ledger.checkpoint();
        ledger.credit(addr(7), &Amount::from_u64(42));
        ledger.rollback();

        assert!(ledger.balance(&addr(7)).is_zero());
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(addr(1), &Amount::from_u64(500));

        ledger.checkpoint();
        ledger
            .transfer(&addr(1), &addr(2), &Amount::from_u64(200))
            .unwrap();
        ledger.commit();

        assert_eq!(ledger.balance(&addr(1)), Amount::from_u64(300));
        assert_eq!(ledger.balance(&addr(2)), Amount::from_u64(200));
    }

    #[test]
    fn test_outer_rollback_undoes_committed_inner_checkpoint() {
        let mut ledger = MemoryLedger::new();
        ledger.checkpoint();
        ledger.checkpoint();
        ledger.credit(addr(7), &Amount::from_u64(42));
        ledger.commit();
        ledger.rollback();

        assert!(ledger.balance(&addr(7)).is_zero());
    }

    #[test]
    fn test_nested_checkpoints() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(addr(1), &Amount::from_u64(100));

        ledger.checkpoint();
        ledger
            .transfer(&addr(1), &addr(2), &Amount::from_u64(10))
            .unwrap();

        ledger.checkpoint();
        ledger
            .transfer(&addr(1), &addr(2), &Amount::from_u64(20))
            .unwrap();
        ledger.rollback();

        ledger.commit();

        assert_eq!(ledger.balance(&addr(1)), Amount::from_u64(90));
        assert_eq!(ledger.balance(&addr(2)), Amount::from_u64(10));
    }
}
