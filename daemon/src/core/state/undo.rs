use std::collections::{BTreeMap, BTreeSet};

use meridian_common::object::{ObjectId, ObjectType};

use super::AnyObject;

/// Before-images recorded by one undo session
#[derive(Debug, Clone, Default)]
pub struct UndoState {
    // Records that existed when the session started and were modified
    old_values: BTreeMap<ObjectId, AnyObject>,
    // Records created during the session
    new_ids: BTreeSet<ObjectId>,
    // Records that existed when the session started and were removed
    removed: BTreeMap<ObjectId, AnyObject>,
    // Next instance of each table when the session started
    old_next_ids: BTreeMap<ObjectType, u64>,
}

impl UndoState {
    pub fn is_empty(&self) -> bool {
        self.old_values.is_empty() && self.new_ids.is_empty() && self.removed.is_empty()
    }

    pub(super) fn snapshot_next_id(&mut self, kind: ObjectType, next_id: u64) {
        self.old_next_ids.entry(kind).or_insert(next_id);
    }

    pub(super) fn on_create(&mut self, id: ObjectId) {
        self.new_ids.insert(id);
    }

    pub(super) fn on_modify(&mut self, before: AnyObject) {
        let id = before.id();
        // Only the first image of the session matters
        if self.new_ids.contains(&id) || self.old_values.contains_key(&id) {
            return;
        }
        self.old_values.insert(id, before);
    }

    pub(super) fn on_remove(&mut self, before: AnyObject) {
        let id = before.id();
        if self.new_ids.remove(&id) {
            return;
        }
        if let Some(original) = self.old_values.remove(&id) {
            self.removed.insert(id, original);
            return;
        }
        self.removed.insert(id, before);
    }

    /// Fold a committed child session into this one, so that undoing this
    /// session also undoes the child.
    pub(super) fn merge(&mut self, child: UndoState) {
        for (id, object) in child.old_values {
            if self.new_ids.contains(&id) || self.old_values.contains_key(&id) {
                continue;
            }
            self.old_values.insert(id, object);
        }

        self.new_ids.extend(child.new_ids);

        for (id, object) in child.removed {
            if self.new_ids.remove(&id) {
                continue;
            }
            if let Some(original) = self.old_values.remove(&id) {
                self.removed.insert(id, original);
                continue;
            }
            self.removed.insert(id, object);
        }

        for (kind, next_id) in child.old_next_ids {
            self.old_next_ids.entry(kind).or_insert(next_id);
        }
    }

    #[allow(clippy::type_complexity)]
    pub(super) fn consume(
        self,
    ) -> (
        BTreeMap<ObjectId, AnyObject>,
        BTreeSet<ObjectId>,
        BTreeMap<ObjectId, AnyObject>,
        BTreeMap<ObjectType, u64>,
    ) {
        (self.old_values, self.new_ids, self.removed, self.old_next_ids)
    }
}
