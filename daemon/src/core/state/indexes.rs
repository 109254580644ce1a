use std::collections::{BTreeMap, BTreeSet};

use meridian_common::{
    crypto::{Address, Hash},
    object::{
        AccountBalanceId, AccountId, AssetId, BalanceId, BitassetDataId, TransactionHistoryId,
    },
    time::TimestampSeconds,
};

/// Secondary indexes over the chain state tables
#[derive(Debug, Default)]
pub struct Indexes {
    pub(super) account_by_name: BTreeMap<String, AccountId>,
    pub(super) asset_by_symbol: BTreeMap<String, AssetId>,
    pub(super) bitasset_by_backing_asset: BTreeSet<(AssetId, BitassetDataId)>,
    pub(super) balance_by_owner: BTreeSet<(Address, BalanceId)>,
    pub(super) account_balance_by_owner: BTreeMap<(AccountId, AssetId), AccountBalanceId>,
    pub(super) transaction_by_id: BTreeMap<Hash, TransactionHistoryId>,
    pub(super) transaction_by_expiration: BTreeSet<(TimestampSeconds, TransactionHistoryId)>,
}

impl Indexes {
    pub fn find_account_by_name(&self, name: &str) -> Option<AccountId> {
        self.account_by_name.get(name).copied()
    }

    pub fn find_asset_by_symbol(&self, symbol: &str) -> Option<AssetId> {
        self.asset_by_symbol.get(symbol).copied()
    }

    /// Bitasset data of every asset backed by `asset`
    pub fn bitassets_backed_by(&self, asset: AssetId) -> impl Iterator<Item = BitassetDataId> + '_ {
        self.bitasset_by_backing_asset
            .range((asset, BitassetDataId::new(0))..=(asset, BitassetDataId::new(u64::MAX)))
            .map(|(_, id)| *id)
    }

    pub fn balances_of(&self, owner: &Address) -> impl Iterator<Item = BalanceId> + '_ {
        self.balance_by_owner
            .range((*owner, BalanceId::new(0))..=(*owner, BalanceId::new(u64::MAX)))
            .map(|(_, id)| *id)
    }

    pub fn find_account_balance(
        &self,
        owner: AccountId,
        asset: AssetId,
    ) -> Option<AccountBalanceId> {
        self.account_balance_by_owner.get(&(owner, asset)).copied()
    }

    pub fn find_transaction(&self, trx_id: &Hash) -> Option<TransactionHistoryId> {
        self.transaction_by_id.get(trx_id).copied()
    }

    /// Transaction history entry expiring first, ties broken by id
    pub fn first_expiring_transaction(&self) -> Option<(TimestampSeconds, TransactionHistoryId)> {
        self.transaction_by_expiration.first().copied()
    }

    pub fn transactions_count(&self) -> usize {
        self.transaction_by_id.len()
    }
}
