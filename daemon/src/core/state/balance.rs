use log::trace;
use meridian_common::{
    asset::AssetAmount,
    config::CORE_ASSET,
    object::{AccountBalanceId, AccountId, AssetId},
    transaction::verify::VerificationError,
};

use super::{AccountBalanceObject, ObjectStore};

impl ObjectStore {
    pub fn get_balance(&self, owner: AccountId, asset: AssetId) -> AssetAmount {
        let amount = self
            .indexes
            .find_account_balance(owner, asset)
            .and_then(|id| self.find::<AccountBalanceObject>(id))
            .map(|row| row.balance)
            .unwrap_or(0);
        AssetAmount::new(amount, asset)
    }

    pub fn credit_balance(
        &mut self,
        owner: AccountId,
        amount: AssetAmount,
    ) -> Result<(), VerificationError> {
        self.adjust_balance(owner, amount.asset_id, amount.amount as i128)
    }

    pub fn debit_balance(
        &mut self,
        owner: AccountId,
        amount: AssetAmount,
    ) -> Result<(), VerificationError> {
        self.adjust_balance(owner, amount.asset_id, -(amount.amount as i128))
    }

    // Any change of a core balance flags the row for the next maintenance
    fn adjust_balance(
        &mut self,
        owner: AccountId,
        asset: AssetId,
        delta: i128,
    ) -> Result<(), VerificationError> {
        if delta == 0 {
            return Ok(());
        }
        if log::log_enabled!(log::Level::Trace) {
            trace!("adjusting balance of {} in {} by {}", owner, asset, delta);
        }

        let Some(id) = self.indexes.find_account_balance(owner, asset) else {
            if delta < 0 {
                return Err(VerificationError::InsufficientBalance {
                    available: 0,
                    required: delta.unsigned_abs() as u64,
                });
            }
            let balance = u64::try_from(delta).map_err(|_| VerificationError::Overflow)?;
            self.create::<AccountBalanceObject>(|id| AccountBalanceObject {
                id,
                owner,
                asset_type: asset,
                balance,
                maintenance_flag: asset == CORE_ASSET,
            });
            return Ok(());
        };

        let current = self.get::<AccountBalanceObject>(id)?.balance;
        let updated = current as i128 + delta;
        if updated < 0 {
            return Err(VerificationError::InsufficientBalance {
                available: current,
                required: delta.unsigned_abs() as u64,
            });
        }
        let updated = u64::try_from(updated).map_err(|_| VerificationError::Overflow)?;
        self.modify::<AccountBalanceObject>(id, |row| {
            row.balance = updated;
            if row.asset_type == CORE_ASSET {
                row.maintenance_flag = true;
            }
        })
    }

    /// Rows whose core balance changed since the last maintenance
    pub fn balances_pending_maintenance(&self) -> Vec<AccountBalanceId> {
        self.account_balances
            .iter()
            .filter(|row| row.maintenance_flag)
            .map(|row| row.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: AccountId = AccountId::new(10);
    const USD: AssetId = AssetId::new(1);

    #[test]
    fn test_credit_creates_row_and_flags_core() {
        let mut store = ObjectStore::new();
        store.credit_balance(ALICE, AssetAmount::new(100, CORE_ASSET)).unwrap();
        store.credit_balance(ALICE, AssetAmount::new(7, USD)).unwrap();

        assert_eq!(store.get_balance(ALICE, CORE_ASSET).amount, 100);
        assert_eq!(store.get_balance(ALICE, USD).amount, 7);
        assert_eq!(store.balances_pending_maintenance().len(), 1);
    }

    #[test]
    fn test_debit_checks_funds() {
        let mut store = ObjectStore::new();
        assert_eq!(
            store.debit_balance(ALICE, AssetAmount::new(1, USD)),
            Err(VerificationError::InsufficientBalance {
                available: 0,
                required: 1
            })
        );
        store.credit_balance(ALICE, AssetAmount::new(5, USD)).unwrap();
        assert!(store.debit_balance(ALICE, AssetAmount::new(6, USD)).is_err());
        store.debit_balance(ALICE, AssetAmount::new(5, USD)).unwrap();
        assert_eq!(store.get_balance(ALICE, USD).amount, 0);
    }
}
