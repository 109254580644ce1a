// Chain state
//
// Every record lives in a typed table keyed by its instance number. Records
// reference each other only by id. All mutations go through the store so
// that an undo session can record the before-image of each touched record
// and restore it as one unit.

mod balance;
mod indexes;
mod objects;
mod undo;

use std::{collections::BTreeMap, fmt::Debug};

use log::{debug, trace};
use meridian_common::{
    object::{ObjectId, ObjectType, TypedId},
    transaction::verify::VerificationError,
};

use crate::core::error::BlockchainError;

pub use indexes::Indexes;
pub use objects::*;
pub use undo::UndoState;

/// One table per record type
#[derive(Debug, Clone)]
pub struct Table<T> {
    objects: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T> Table<T> {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.objects.values()
    }

    // Never below a record that still exists, whatever was changed outside
    // of the session being reverted
    fn rewind_next_id(&mut self, next_id: u64) {
        let floor = self
            .objects
            .last_key_value()
            .map_or(0, |(instance, _)| instance + 1);
        self.next_id = next_id.max(floor);
    }
}

/// Maintains secondary indexes for one record type
pub trait Indexed {
    fn index(&self, _indexes: &mut Indexes) {}

    fn unindex(&self, _indexes: &mut Indexes) {}
}

/// A record stored in the chain state
pub trait ChainObject: Clone + Debug + Indexed + Into<AnyObject> {
    type Id: TypedId;

    fn id(&self) -> Self::Id;

    fn table(store: &ObjectStore) -> &Table<Self>;

    fn table_mut(store: &mut ObjectStore) -> &mut Table<Self>;
}

#[derive(Debug, Default)]
pub struct ObjectStore {
    accounts: Table<AccountObject>,
    assets: Table<AssetObject>,
    balances: Table<BalanceObject>,
    account_balances: Table<AccountBalanceObject>,
    bitasset_data: Table<BitassetDataObject>,
    transaction_history: Table<TransactionHistoryObject>,
    block_summaries: Table<BlockSummaryObject>,
    dynamic_global_properties: Table<DynamicGlobalPropertyObject>,
    indexes: Indexes,
    // Stack of active undo sessions, innermost last
    sessions: Vec<UndoState>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indexes(&self) -> &Indexes {
        &self.indexes
    }

    pub fn table<T: ChainObject>(&self) -> &Table<T> {
        T::table(self)
    }

    // Id the next created record of this type will receive
    pub fn next_id<T: ChainObject>(&self) -> T::Id {
        T::Id::from_instance(T::table(self).next_id)
    }

    pub fn find<T: ChainObject>(&self, id: T::Id) -> Option<&T> {
        T::table(self).objects.get(&id.instance())
    }

    pub fn get<T: ChainObject>(&self, id: T::Id) -> Result<&T, VerificationError> {
        self.find(id)
            .ok_or_else(|| VerificationError::NotFound(id.into()))
    }

    pub fn get_dynamic_global_properties(
        &self,
    ) -> Result<&DynamicGlobalPropertyObject, VerificationError> {
        self.get(DynamicGlobalPropertyObject::ID)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        let instance = id.instance;
        match id.kind {
            ObjectType::Account => self.accounts.objects.contains_key(&instance),
            ObjectType::Asset => self.assets.objects.contains_key(&instance),
            ObjectType::Balance => self.balances.objects.contains_key(&instance),
            ObjectType::AccountBalance => self.account_balances.objects.contains_key(&instance),
            ObjectType::BitassetData => self.bitasset_data.objects.contains_key(&instance),
            ObjectType::TransactionHistory => {
                self.transaction_history.objects.contains_key(&instance)
            }
            ObjectType::BlockSummary => self.block_summaries.objects.contains_key(&instance),
            ObjectType::DynamicGlobalProperty => {
                self.dynamic_global_properties.objects.contains_key(&instance)
            }
        }
    }

    // Ids are handed out in sequence and never reused, removed or not
    pub fn create<T: ChainObject>(&mut self, build: impl FnOnce(T::Id) -> T) -> T::Id {
        let table = T::table_mut(self);
        let instance = table.next_id;
        table.next_id += 1;

        let id = T::Id::from_instance(instance);
        let object = build(id);
        object.index(&mut self.indexes);
        T::table_mut(self).objects.insert(instance, object);

        let object_id: ObjectId = id.into();
        if let Some(session) = self.sessions.last_mut() {
            session.on_create(object_id);
        }
        if log::log_enabled!(log::Level::Trace) {
            trace!("created object {}", object_id);
        }
        id
    }

    pub fn modify<T: ChainObject>(
        &mut self,
        id: T::Id,
        f: impl FnOnce(&mut T),
    ) -> Result<(), VerificationError> {
        let object = T::table_mut(self)
            .objects
            .get_mut(&id.instance())
            .ok_or_else(|| VerificationError::NotFound(id.into()))?;

        let before = object.clone();
        f(object);
        let after = object.clone();

        before.unindex(&mut self.indexes);
        after.index(&mut self.indexes);

        if let Some(session) = self.sessions.last_mut() {
            session.on_modify(before.into());
        }
        Ok(())
    }

    pub fn remove<T: ChainObject>(&mut self, id: T::Id) -> Result<T, VerificationError> {
        let object = T::table_mut(self)
            .objects
            .remove(&id.instance())
            .ok_or_else(|| VerificationError::NotFound(id.into()))?;
        object.unindex(&mut self.indexes);

        if let Some(session) = self.sessions.last_mut() {
            session.on_remove(object.clone().into());
        }
        if log::log_enabled!(log::Level::Trace) {
            let object_id: ObjectId = id.into();
            trace!("removed object {}", object_id);
        }
        Ok(object)
    }

    // Writes bypassing the undo log, used when restoring before-images
    fn raw_insert<T: ChainObject>(&mut self, object: T) {
        let instance = object.id().instance();
        if let Some(current) = T::table_mut(self).objects.remove(&instance) {
            current.unindex(&mut self.indexes);
        }
        object.index(&mut self.indexes);
        T::table_mut(self).objects.insert(instance, object);
    }

    fn raw_remove<T: ChainObject>(&mut self, id: T::Id) {
        if let Some(object) = T::table_mut(self).objects.remove(&id.instance()) {
            object.unindex(&mut self.indexes);
        }
    }

    fn raw_remove_id(&mut self, id: ObjectId) {
        let instance = id.instance;
        match id.kind {
            ObjectType::Account => {
                self.raw_remove::<AccountObject>(TypedId::from_instance(instance))
            }
            ObjectType::Asset => self.raw_remove::<AssetObject>(TypedId::from_instance(instance)),
            ObjectType::Balance => {
                self.raw_remove::<BalanceObject>(TypedId::from_instance(instance))
            }
            ObjectType::AccountBalance => {
                self.raw_remove::<AccountBalanceObject>(TypedId::from_instance(instance))
            }
            ObjectType::BitassetData => {
                self.raw_remove::<BitassetDataObject>(TypedId::from_instance(instance))
            }
            ObjectType::TransactionHistory => {
                self.raw_remove::<TransactionHistoryObject>(TypedId::from_instance(instance))
            }
            ObjectType::BlockSummary => {
                self.raw_remove::<BlockSummaryObject>(TypedId::from_instance(instance))
            }
            ObjectType::DynamicGlobalProperty => {
                self.raw_remove::<DynamicGlobalPropertyObject>(TypedId::from_instance(instance))
            }
        }
    }

    fn set_next_instance(&mut self, kind: ObjectType, next_id: u64) {
        match kind {
            ObjectType::Account => self.accounts.rewind_next_id(next_id),
            ObjectType::Asset => self.assets.rewind_next_id(next_id),
            ObjectType::Balance => self.balances.rewind_next_id(next_id),
            ObjectType::AccountBalance => self.account_balances.rewind_next_id(next_id),
            ObjectType::BitassetData => self.bitasset_data.rewind_next_id(next_id),
            ObjectType::TransactionHistory => self.transaction_history.rewind_next_id(next_id),
            ObjectType::BlockSummary => self.block_summaries.rewind_next_id(next_id),
            ObjectType::DynamicGlobalProperty => {
                self.dynamic_global_properties.rewind_next_id(next_id)
            }
        }
    }

    /// Depth of nested undo sessions
    pub fn session_depth(&self) -> usize {
        self.sessions.len()
    }

    pub fn start_undo_session(&mut self) {
        let depth = self.sessions.len();
        let mut state = UndoState::default();
        for (kind, next_id) in self.next_instances() {
            state.snapshot_next_id(kind, next_id);
        }
        self.sessions.push(state);
        trace!("started undo session at depth {}", depth);
    }

    /// Keep the changes of the innermost session. A nested session is merged
    /// into its parent, the outermost one becomes permanent.
    pub fn commit_undo_session(&mut self) -> Result<(), BlockchainError> {
        let state = self.sessions.pop().ok_or(BlockchainError::NoUndoSession)?;
        if let Some(parent) = self.sessions.last_mut() {
            parent.merge(state);
        }
        Ok(())
    }

    /// Same as a commit, but the outermost session log is handed back so the
    /// caller can revert it later.
    pub fn detach_undo_session(&mut self) -> Result<UndoState, BlockchainError> {
        if self.sessions.len() != 1 {
            return Err(BlockchainError::NoUndoSession);
        }
        self.sessions.pop().ok_or(BlockchainError::NoUndoSession)
    }

    /// Discard every change of the innermost session
    pub fn undo_session(&mut self) -> Result<(), BlockchainError> {
        let state = self.sessions.pop().ok_or(BlockchainError::NoUndoSession)?;
        self.revert(state);
        Ok(())
    }

    /// Restore the state recorded by a detached session log
    pub fn revert(&mut self, state: UndoState) {
        let (old_values, new_ids, removed, next_ids) = state.consume();
        debug!(
            "reverting {} modified, {} created and {} removed objects",
            old_values.len(),
            new_ids.len(),
            removed.len()
        );

        for id in new_ids {
            self.raw_remove_id(id);
        }
        for object in old_values.into_values().chain(removed.into_values()) {
            object.restore(self);
        }
        for (kind, next_id) in next_ids {
            self.set_next_instance(kind, next_id);
        }
    }

    fn next_instances(&self) -> [(ObjectType, u64); 8] {
        [
            (ObjectType::Account, self.accounts.next_id),
            (ObjectType::Asset, self.assets.next_id),
            (ObjectType::Balance, self.balances.next_id),
            (ObjectType::AccountBalance, self.account_balances.next_id),
            (ObjectType::BitassetData, self.bitasset_data.next_id),
            (ObjectType::TransactionHistory, self.transaction_history.next_id),
            (ObjectType::BlockSummary, self.block_summaries.next_id),
            (
                ObjectType::DynamicGlobalProperty,
                self.dynamic_global_properties.next_id,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_common::object::AccountId;

    fn account(store: &mut ObjectStore, name: &str) -> AccountId {
        store.create(|id| AccountObject::new(id, name))
    }

    #[test]
    fn test_ids_are_sequential_and_not_reused() {
        let mut store = ObjectStore::new();
        let a = account(&mut store, "a");
        let b = account(&mut store, "b");
        assert_eq!(a.instance(), 0);
        assert_eq!(b.instance(), 1);
        store.remove::<AccountObject>(b).unwrap();
        assert_eq!(account(&mut store, "c").instance(), 2);
    }

    #[test]
    fn test_undo_restores_everything() {
        let mut store = ObjectStore::new();
        let a = account(&mut store, "alice");
        let b = account(&mut store, "bob");

        store.start_undo_session();
        store.modify::<AccountObject>(a, |acc| acc.name = "carol".to_string()).unwrap();
        store.remove::<AccountObject>(b).unwrap();
        let c = account(&mut store, "dave");
        store.undo_session().unwrap();

        assert_eq!(store.get::<AccountObject>(a).unwrap().name, "alice");
        assert_eq!(store.get::<AccountObject>(b).unwrap().name, "bob");
        assert!(store.find::<AccountObject>(c).is_none());
        assert_eq!(store.next_id::<AccountObject>().instance(), 2);
    }

    #[test]
    fn test_nested_commit_then_outer_undo() {
        let mut store = ObjectStore::new();
        let a = account(&mut store, "alice");

        store.start_undo_session();
        store.modify::<AccountObject>(a, |acc| acc.name = "bob".to_string()).unwrap();
        store.start_undo_session();
        store.modify::<AccountObject>(a, |acc| acc.name = "carol".to_string()).unwrap();
        let d = account(&mut store, "dave");
        store.commit_undo_session().unwrap();
        assert_eq!(store.session_depth(), 1);
        store.undo_session().unwrap();

        assert_eq!(store.get::<AccountObject>(a).unwrap().name, "alice");
        assert!(store.find::<AccountObject>(d).is_none());
    }

    #[test]
    fn test_removed_after_modify_restores_original() {
        let mut store = ObjectStore::new();
        let a = account(&mut store, "alice");

        store.start_undo_session();
        store.modify::<AccountObject>(a, |acc| acc.name = "bob".to_string()).unwrap();
        store.start_undo_session();
        store.remove::<AccountObject>(a).unwrap();
        store.commit_undo_session().unwrap();
        store.undo_session().unwrap();

        assert_eq!(store.get::<AccountObject>(a).unwrap().name, "alice");
    }

    #[test]
    fn test_detached_session_can_be_reverted() {
        let mut store = ObjectStore::new();
        let a = account(&mut store, "alice");

        store.start_undo_session();
        store.modify::<AccountObject>(a, |acc| acc.name = "bob".to_string()).unwrap();
        let state = store.detach_undo_session().unwrap();
        assert_eq!(store.session_depth(), 0);
        assert_eq!(store.get::<AccountObject>(a).unwrap().name, "bob");

        store.revert(state);
        assert_eq!(store.get::<AccountObject>(a).unwrap().name, "alice");
    }

    #[test]
    fn test_revert_keeps_ids_of_later_records() {
        let mut store = ObjectStore::new();
        account(&mut store, "alice");

        store.start_undo_session();
        let bob = account(&mut store, "bob");
        let state = store.detach_undo_session().unwrap();

        // Created after the detached session, outside of any log
        let carol = account(&mut store, "carol");
        store.revert(state);
        assert!(store.find::<AccountObject>(bob).is_none());
        assert_eq!(store.get::<AccountObject>(carol).unwrap().name, "carol");

        let dave = account(&mut store, "dave");
        assert!(dave.instance() > carol.instance());
        assert_eq!(store.get::<AccountObject>(carol).unwrap().name, "carol");
    }

    #[test]
    fn test_session_calls_without_session_fail() {
        let mut store = ObjectStore::new();
        assert!(matches!(
            store.commit_undo_session(),
            Err(BlockchainError::NoUndoSession)
        ));
        assert!(matches!(
            store.undo_session(),
            Err(BlockchainError::NoUndoSession)
        ));
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let mut store = ObjectStore::new();
        let missing = AccountId::new(7);
        assert_eq!(
            store.modify::<AccountObject>(missing, |_| {}),
            Err(VerificationError::NotFound(missing.into()))
        );
    }
}
