use std::sync::Arc;

use shared::{
    domain::{CollectionPatch, TodoCollection, TodoId, TodoItem, TodoPatch, UserId},
    error::StoreError,
};
use tracing::debug;

use crate::flag_store::FlagStore;

/// Stateless CRUD facade over an externally persisted per-user collection.
/// The store never holds an authoritative copy; every call reads or writes
/// through the injected `FlagStore`.
#[derive(Clone)]
pub struct TodoStore {
    flags: Arc<dyn FlagStore>,
}

impl TodoStore {
    pub fn new(flags: Arc<dyn FlagStore>) -> Self {
        Self { flags }
    }

    /// Current collection for a user; empty when the user has no flags yet.
    pub async fn get_collection(&self, user_id: &UserId) -> Result<TodoCollection, StoreError> {
        self.flags
            .read(user_id)
            .await?
            .ok_or_else(|| StoreError::UnknownUser(user_id.clone()))
    }

    /// Folds every known user's collection into one map. On an id collision
    /// the later user in directory order wins; there is no conflict
    /// detection beyond that.
    pub async fn get_aggregate(&self) -> Result<TodoCollection, StoreError> {
        let mut aggregate = TodoCollection::new();
        for user_id in self.flags.user_ids().await? {
            if let Some(collection) = self.flags.read(&user_id).await? {
                aggregate.extend(collection);
            }
        }
        Ok(aggregate)
    }

    /// Constructs and persists a new item as a singleton sparse addition to
    /// the user's collection. `is_done` defaults to false and `label` to the
    /// empty string unless the draft supplies them.
    pub async fn create(&self, user_id: &UserId, draft: TodoPatch) -> Result<TodoItem, StoreError> {
        let existing = self.get_collection(user_id).await?;

        let mut id = TodoId::generate();
        while existing.contains_key(&id) {
            id = TodoId::generate();
        }

        let item = TodoItem {
            id: id.clone(),
            label: draft.label.unwrap_or_default(),
            is_done: draft.is_done.unwrap_or(false),
            user_id: user_id.clone(),
        };

        let patch = CollectionPatch::from([(
            id,
            TodoPatch {
                label: Some(item.label.clone()),
                is_done: Some(item.is_done),
            },
        )]);
        self.flags.merge_write(user_id, &patch).await?;
        debug!(user_id = %item.user_id, todo_id = %item.id, "created todo");
        Ok(item)
    }

    /// Sparse merge of `patch` into a single item, located through the
    /// aggregate view. Returns `Ok(false)` when the id resolves nowhere.
    pub async fn update(&self, todo_id: &TodoId, patch: TodoPatch) -> Result<bool, StoreError> {
        let Some(owner) = self.owner_of(todo_id).await? else {
            debug!(%todo_id, "update targets an unknown todo; nothing to do");
            return Ok(false);
        };
        let patch = CollectionPatch::from([(todo_id.clone(), patch)]);
        self.flags.merge_write(&owner, &patch).await?;
        Ok(true)
    }

    /// Physically removes one item from its owner's collection. Returns
    /// `Ok(false)` when the id resolves nowhere.
    pub async fn delete(&self, todo_id: &TodoId) -> Result<bool, StoreError> {
        let Some(owner) = self.owner_of(todo_id).await? else {
            debug!(%todo_id, "delete targets an unknown todo; nothing to do");
            return Ok(false);
        };
        Ok(self.flags.remove(&owner, todo_id).await?)
    }

    /// Lower-level bulk primitive: merges the patch straight into the user's
    /// stored collection. Building block for form-driven edits that touch an
    /// arbitrary subset of items in one submission.
    pub async fn update_user_collection(
        &self,
        user_id: &UserId,
        patch: &CollectionPatch,
    ) -> Result<(), StoreError> {
        // Resolve the user first so a bad id signals instead of writing.
        self.get_collection(user_id).await?;
        Ok(self.flags.merge_write(user_id, patch).await?)
    }

    async fn owner_of(&self, todo_id: &TodoId) -> Result<Option<UserId>, StoreError> {
        Ok(self
            .get_aggregate()
            .await?
            .remove(todo_id)
            .map(|item| item.user_id))
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
