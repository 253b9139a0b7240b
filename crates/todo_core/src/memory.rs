use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use shared::domain::{CollectionPatch, TodoCollection, TodoId, TodoItem, UserId};

use crate::flag_store::FlagStore;

/// In-memory `FlagStore` backend. Users must be registered before their
/// collections can be written, mirroring the sqlite backend's directory.
#[derive(Default)]
pub struct MemoryFlagStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    // Registration order doubles as directory order for the aggregate fold.
    order: Vec<UserId>,
    collections: HashMap<UserId, TodoCollection>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_user(&self, user_id: UserId) {
        let mut state = self.inner.lock().await;
        if !state.collections.contains_key(&user_id) {
            state.order.push(user_id.clone());
            state.collections.insert(user_id, TodoCollection::new());
        }
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn read(&self, user_id: &UserId) -> Result<Option<TodoCollection>> {
        Ok(self.inner.lock().await.collections.get(user_id).cloned())
    }

    async fn merge_write(&self, user_id: &UserId, patch: &CollectionPatch) -> Result<()> {
        let mut state = self.inner.lock().await;
        let collection = state
            .collections
            .get_mut(user_id)
            .ok_or_else(|| anyhow!("unknown user '{user_id}'"))?;

        for (todo_id, fields) in patch {
            let entry = collection
                .entry(todo_id.clone())
                .or_insert_with(|| TodoItem {
                    id: todo_id.clone(),
                    label: String::new(),
                    is_done: false,
                    user_id: user_id.clone(),
                });
            if let Some(label) = &fields.label {
                entry.label = label.clone();
            }
            if let Some(is_done) = fields.is_done {
                entry.is_done = is_done;
            }
        }
        Ok(())
    }

    async fn remove(&self, user_id: &UserId, todo_id: &TodoId) -> Result<bool> {
        let mut state = self.inner.lock().await;
        let Some(collection) = state.collections.get_mut(user_id) else {
            return Ok(false);
        };
        Ok(collection.remove(todo_id).is_some())
    }

    async fn user_ids(&self) -> Result<Vec<UserId>> {
        Ok(self.inner.lock().await.order.clone())
    }
}
