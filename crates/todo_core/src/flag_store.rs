use anyhow::Result;
use async_trait::async_trait;

use shared::domain::{CollectionPatch, TodoCollection, TodoId, UserId};

/// Seam to the per-user flag persistence facility.
///
/// Deletion is a first-class operation: `remove` must physically drop the
/// key instead of writing a null placeholder.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Returns `None` when the user is not known to the backend and
    /// `Some(empty)` when the user exists but has no stored flags.
    async fn read(&self, user_id: &UserId) -> Result<Option<TodoCollection>>;

    /// Sparse merge: only the entries named by the patch are touched, and
    /// within an entry only the supplied fields. Entries that do not exist
    /// yet are created.
    async fn merge_write(&self, user_id: &UserId, patch: &CollectionPatch) -> Result<()>;

    /// Removes exactly one key from the user's collection, leaving siblings
    /// untouched. Returns whether an entry was actually present.
    async fn remove(&self, user_id: &UserId, todo_id: &TodoId) -> Result<bool>;

    /// Known users in directory order; drives the aggregate fold.
    async fn user_ids(&self) -> Result<Vec<UserId>>;
}
