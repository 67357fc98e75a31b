//! # Custody Journal
//!
//! Custody lives outside the engine, so the staged-state trick used for the
//! vault record cannot cover it. Instead every transfer made during a call is
//! journaled and, unless the call commits, replayed in reverse.

use crate::errors::CustodyError;
use crate::ports::AssetCustody;
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};
use tracing::error;

/// A completed custody transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Asset moved.
    pub asset: Address,
    /// Debited account.
    pub from: Address,
    /// Credited account.
    pub to: Address,
    /// Amount moved.
    pub amount: U256,
}

/// Position in the journal to roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savepoint(usize);

/// Journaled view over an [`AssetCustody`].
///
/// Dropping an uncommitted transaction reverses every recorded transfer.
pub struct CustodyTx<'c> {
    custody: &'c dyn AssetCustody,
    journal: Vec<TransferRecord>,
    committed: bool,
}

impl<'c> CustodyTx<'c> {
    /// Opens a transaction over `custody`.
    #[must_use]
    pub fn new(custody: &'c dyn AssetCustody) -> Self {
        Self {
            custody,
            journal: Vec::new(),
            committed: false,
        }
    }

    /// Balance of `asset` held by `holder`, including this transaction's
    /// own transfers.
    #[must_use]
    pub fn balance_of(&self, asset: Address, holder: Address) -> U256 {
        self.custody.balance_of(asset, holder)
    }

    /// Decimals of `asset`.
    #[must_use]
    pub fn decimals(&self, asset: Address) -> u8 {
        self.custody.decimals(asset)
    }

    /// Transfers and records. Zero amounts are skipped.
    ///
    /// # Errors
    ///
    /// Whatever the custody reports; nothing is recorded on failure.
    pub fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), CustodyError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.custody.transfer(asset, from, to, amount)?;
        self.journal.push(TransferRecord {
            asset,
            from,
            to,
            amount,
        });
        Ok(())
    }

    /// Marks the current journal position.
    #[must_use]
    pub fn savepoint(&self) -> Savepoint {
        Savepoint(self.journal.len())
    }

    /// Reverses every transfer recorded after `savepoint`, newest first.
    pub fn rollback_to(&mut self, savepoint: Savepoint) {
        while self.journal.len() > savepoint.0 {
            let Some(record) = self.journal.pop() else {
                break;
            };
            if let Err(err) =
                self.custody
                    .transfer(record.asset, record.to, record.from, record.amount)
            {
                error!(
                    asset = ?record.asset,
                    from = ?record.to,
                    to = ?record.from,
                    amount = %record.amount,
                    error = %err,
                    "Failed to reverse custody transfer"
                );
            }
        }
    }

    /// Transfers recorded so far.
    #[must_use]
    pub fn journal(&self) -> &[TransferRecord] {
        &self.journal
    }

    /// Keeps every transfer and returns the journal.
    #[must_use]
    pub fn commit(mut self) -> Vec<TransferRecord> {
        self.committed = true;
        std::mem::take(&mut self.journal)
    }
}

impl Drop for CustodyTx<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback_to(Savepoint(0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryCustody;

    fn asset() -> Address {
        Address::repeat_byte(0xA0)
    }

    #[test]
    fn test_drop_without_commit_reverses() {
        let custody = InMemoryCustody::new();
        let alice = Address::repeat_byte(1);
        let bob = Address::repeat_byte(2);
        custody.mint(asset(), alice, U256::from(100));

        {
            let mut tx = CustodyTx::new(&custody);
            tx.transfer(asset(), alice, bob, U256::from(60)).unwrap();
            assert_eq!(tx.balance_of(asset(), bob), U256::from(60));
        }

        assert_eq!(custody.balance_of(asset(), alice), U256::from(100));
        assert_eq!(custody.balance_of(asset(), bob), U256::zero());
    }

    #[test]
    fn test_commit_keeps_transfers() {
        let custody = InMemoryCustody::new();
        let alice = Address::repeat_byte(1);
        let bob = Address::repeat_byte(2);
        custody.mint(asset(), alice, U256::from(100));

        let mut tx = CustodyTx::new(&custody);
        tx.transfer(asset(), alice, bob, U256::from(60)).unwrap();
        let journal = tx.commit();

        assert_eq!(journal.len(), 1);
        assert_eq!(custody.balance_of(asset(), bob), U256::from(60));
    }

    #[test]
    fn test_rollback_to_savepoint() {
        let custody = InMemoryCustody::new();
        let alice = Address::repeat_byte(1);
        let bob = Address::repeat_byte(2);
        custody.mint(asset(), alice, U256::from(100));

        let mut tx = CustodyTx::new(&custody);
        tx.transfer(asset(), alice, bob, U256::from(10)).unwrap();
        let mark = tx.savepoint();
        tx.transfer(asset(), alice, bob, U256::from(20)).unwrap();
        tx.rollback_to(mark);
        let _ = tx.commit();

        assert_eq!(custody.balance_of(asset(), bob), U256::from(10));
    }
}
