use serde::{Deserialize, Serialize};

use meridian_common::{
    account::{VestingContext, VestingPolicy},
    asset::{AssetAmount, AssetOptions, BitassetOptions},
    block::BlockId,
    crypto::{Address, Hash},
    object::{
        AccountBalanceId, AccountId, AssetId, BalanceId, BitassetDataId, BlockSummaryId,
        DynamicGlobalPropertyId, ObjectId, TransactionHistoryId,
    },
    time::TimestampSeconds,
};

use super::{ChainObject, Indexed, Indexes, ObjectStore, Table};

macro_rules! chain_object {
    ($object:ident, $id:ty, $table:ident, $variant:ident) => {
        impl ChainObject for $object {
            type Id = $id;

            fn id(&self) -> Self::Id {
                self.id
            }

            fn table(store: &ObjectStore) -> &Table<Self> {
                &store.$table
            }

            fn table_mut(store: &mut ObjectStore) -> &mut Table<Self> {
                &mut store.$table
            }
        }

        impl From<$object> for AnyObject {
            fn from(object: $object) -> Self {
                AnyObject::$variant(object)
            }
        }
    };
}

/// Before-image of any record, as kept by undo sessions
#[derive(Debug, Clone)]
pub enum AnyObject {
    Account(AccountObject),
    Asset(AssetObject),
    Balance(BalanceObject),
    AccountBalance(AccountBalanceObject),
    BitassetData(BitassetDataObject),
    TransactionHistory(TransactionHistoryObject),
    BlockSummary(BlockSummaryObject),
    DynamicGlobalProperty(DynamicGlobalPropertyObject),
}

impl AnyObject {
    pub fn id(&self) -> ObjectId {
        match self {
            AnyObject::Account(o) => o.id.into(),
            AnyObject::Asset(o) => o.id.into(),
            AnyObject::Balance(o) => o.id.into(),
            AnyObject::AccountBalance(o) => o.id.into(),
            AnyObject::BitassetData(o) => o.id.into(),
            AnyObject::TransactionHistory(o) => o.id.into(),
            AnyObject::BlockSummary(o) => o.id.into(),
            AnyObject::DynamicGlobalProperty(o) => o.id.into(),
        }
    }

    pub(super) fn restore(self, store: &mut ObjectStore) {
        match self {
            AnyObject::Account(o) => store.raw_insert(o),
            AnyObject::Asset(o) => store.raw_insert(o),
            AnyObject::Balance(o) => store.raw_insert(o),
            AnyObject::AccountBalance(o) => store.raw_insert(o),
            AnyObject::BitassetData(o) => store.raw_insert(o),
            AnyObject::TransactionHistory(o) => store.raw_insert(o),
            AnyObject::BlockSummary(o) => store.raw_insert(o),
            AnyObject::DynamicGlobalProperty(o) => store.raw_insert(o),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountObject {
    pub id: AccountId,
    pub name: String,
}

impl AccountObject {
    pub fn new(id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Indexed for AccountObject {
    fn index(&self, indexes: &mut Indexes) {
        indexes.account_by_name.insert(self.name.clone(), self.id);
    }

    fn unindex(&self, indexes: &mut Indexes) {
        indexes.account_by_name.remove(&self.name);
    }
}

chain_object!(AccountObject, AccountId, accounts, Account);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    pub id: AssetId,
    pub symbol: String,
    pub issuer: AccountId,
    pub precision: u8,
    pub options: AssetOptions,
    pub bitasset_data_id: Option<BitassetDataId>,
}

impl AssetObject {
    // Market issued assets are the ones carrying bitasset data
    pub fn is_market_issued(&self) -> bool {
        self.bitasset_data_id.is_some()
    }
}

impl Indexed for AssetObject {
    fn index(&self, indexes: &mut Indexes) {
        indexes.asset_by_symbol.insert(self.symbol.clone(), self.id);
    }

    fn unindex(&self, indexes: &mut Indexes) {
        indexes.asset_by_symbol.remove(&self.symbol);
    }
}

chain_object!(AssetObject, AssetId, assets, Asset);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitassetDataObject {
    pub id: BitassetDataId,
    // Asset these options belong to
    pub asset_id: AssetId,
    pub options: BitassetOptions,
    pub is_prediction_market: bool,
}

impl Indexed for BitassetDataObject {
    fn index(&self, indexes: &mut Indexes) {
        indexes
            .bitasset_by_backing_asset
            .insert((self.options.short_backing_asset, self.id));
    }

    fn unindex(&self, indexes: &mut Indexes) {
        indexes
            .bitasset_by_backing_asset
            .remove(&(self.options.short_backing_asset, self.id));
    }
}

chain_object!(BitassetDataObject, BitassetDataId, bitasset_data, BitassetData);

/// Balance owned by an address rather than an account, usually imported at
/// genesis. It has to be claimed into an account before it can be spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceObject {
    pub id: BalanceId,
    pub owner: Address,
    pub balance: AssetAmount,
    pub vesting_policy: Option<VestingPolicy>,
    pub last_claim_date: TimestampSeconds,
}

impl BalanceObject {
    pub fn is_vesting_balance(&self) -> bool {
        self.vesting_policy.is_some()
    }

    pub fn asset_type(&self) -> AssetId {
        self.balance.asset_id
    }

    // Amount that could be claimed right now
    pub fn available(&self, now: TimestampSeconds) -> AssetAmount {
        match &self.vesting_policy {
            Some(policy) => policy.get_allowed_withdraw(&VestingContext::new(
                self.balance,
                now,
                AssetAmount::zero(self.balance.asset_id),
            )),
            None => self.balance,
        }
    }
}

impl Indexed for BalanceObject {
    fn index(&self, indexes: &mut Indexes) {
        indexes.balance_by_owner.insert((self.owner, self.id));
    }

    fn unindex(&self, indexes: &mut Indexes) {
        indexes.balance_by_owner.remove(&(self.owner, self.id));
    }
}

chain_object!(BalanceObject, BalanceId, balances, Balance);

/// Amount of one asset held by one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceObject {
    pub id: AccountBalanceId,
    pub owner: AccountId,
    pub asset_type: AssetId,
    pub balance: u64,
    // Set when the core balance changed since the last maintenance
    pub maintenance_flag: bool,
}

impl Indexed for AccountBalanceObject {
    fn index(&self, indexes: &mut Indexes) {
        indexes
            .account_balance_by_owner
            .insert((self.owner, self.asset_type), self.id);
    }

    fn unindex(&self, indexes: &mut Indexes) {
        indexes
            .account_balance_by_owner
            .remove(&(self.owner, self.asset_type));
    }
}

chain_object!(
    AccountBalanceObject,
    AccountBalanceId,
    account_balances,
    AccountBalance
);

/// Fingerprint of an accepted transaction, kept until it expires so the
/// same transaction cannot be included twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHistoryObject {
    pub id: TransactionHistoryId,
    pub trx_id: Hash,
    pub expiration: TimestampSeconds,
}

impl Indexed for TransactionHistoryObject {
    fn index(&self, indexes: &mut Indexes) {
        indexes.transaction_by_id.insert(self.trx_id, self.id);
        indexes
            .transaction_by_expiration
            .insert((self.expiration, self.id));
    }

    fn unindex(&self, indexes: &mut Indexes) {
        indexes.transaction_by_id.remove(&self.trx_id);
        indexes
            .transaction_by_expiration
            .remove(&(self.expiration, self.id));
    }
}

chain_object!(
    TransactionHistoryObject,
    TransactionHistoryId,
    transaction_history,
    TransactionHistory
);

/// Slot `num & 0xFFFF` of the ring of recent block ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummaryObject {
    pub id: BlockSummaryId,
    pub block_id: BlockId,
}

impl Indexed for BlockSummaryObject {}

chain_object!(BlockSummaryObject, BlockSummaryId, block_summaries, BlockSummary);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicGlobalPropertyObject {
    pub id: DynamicGlobalPropertyId,
    pub head_block_number: u32,
    pub head_block_id: BlockId,
    pub time: TimestampSeconds,
    pub next_maintenance_time: TimestampSeconds,
}

impl DynamicGlobalPropertyObject {
    pub const ID: DynamicGlobalPropertyId = DynamicGlobalPropertyId::new(0);
}

impl Indexed for DynamicGlobalPropertyObject {}

chain_object!(
    DynamicGlobalPropertyObject,
    DynamicGlobalPropertyId,
    dynamic_global_properties,
    DynamicGlobalProperty
);

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_common::account::CddVestingPolicy;

    #[test]
    fn test_secondary_indexes_follow_modifications() {
        let mut store = ObjectStore::new();
        let core = AssetId::new(0);
        let usd = AssetId::new(1);
        let id = store.create(|id| BitassetDataObject {
            id,
            asset_id: usd,
            options: BitassetOptions::backed_by(core),
            is_prediction_market: false,
        });
        assert_eq!(store.indexes().bitassets_backed_by(core).collect::<Vec<_>>(), vec![id]);

        store
            .modify::<BitassetDataObject>(id, |b| b.options.short_backing_asset = usd)
            .unwrap();
        assert_eq!(store.indexes().bitassets_backed_by(core).count(), 0);
        assert_eq!(store.indexes().bitassets_backed_by(usd).collect::<Vec<_>>(), vec![id]);
    }

    #[test]
    fn test_balance_available() {
        let owner = Address::new([1u8; 20]);
        let plain = BalanceObject {
            id: BalanceId::new(0),
            owner,
            balance: AssetAmount::new(500, AssetId::new(0)),
            vesting_policy: None,
            last_claim_date: 0,
        };
        assert_eq!(plain.available(1_000).amount, 500);

        let vesting = BalanceObject {
            vesting_policy: Some(VestingPolicy::CoinDaysDestroyed(CddVestingPolicy::new(100, 0))),
            ..plain.clone()
        };
        assert!(vesting.is_vesting_balance());
        assert_eq!(vesting.available(10).amount, 50);
    }

    #[test]
    fn test_any_object_id() {
        let object: AnyObject = AccountObject::new(AccountId::new(9), "nine").into();
        assert_eq!(object.id(), AccountId::new(9).into());
    }
}
