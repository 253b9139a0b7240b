use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{CollectionPatch, TodoCollection, TodoId, TodoPatch, UserId},
    error::StoreError,
};
use tracing::{info, warn};

use crate::store::TodoStore;

/// External rendering facility: receives the data to draw whenever the
/// presenter (re-)renders.
pub trait ListView: Send + Sync {
    fn render(&self, user_id: &UserId, todos: &TodoCollection);
}

/// Yes/no dialog shown before destructive actions.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, title: &str, content: &str) -> bool;
}

/// Discrete UI actions reported back by the rendered form.
#[derive(Debug, Clone, PartialEq)]
pub enum ListAction {
    Create,
    Delete(TodoId),
    Submit(CollectionPatch),
}

#[derive(Debug, Clone, Copy)]
pub struct PresenterOptions {
    /// When false the form stays open after a submission so successive edits
    /// land in the same session.
    pub close_on_submit: bool,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self {
            close_on_submit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PresenterState {
    Closed,
    Open(UserId),
}

/// Binds a `TodoStore` to an injected view and confirmation prompt and
/// translates UI actions into store calls, re-rendering after each mutation.
pub struct ListPresenter {
    store: TodoStore,
    view: Arc<dyn ListView>,
    prompt: Arc<dyn ConfirmPrompt>,
    options: PresenterOptions,
    state: PresenterState,
}

impl ListPresenter {
    pub fn new(
        store: TodoStore,
        view: Arc<dyn ListView>,
        prompt: Arc<dyn ConfirmPrompt>,
        options: PresenterOptions,
    ) -> Self {
        Self {
            store,
            view,
            prompt,
            options,
            state: PresenterState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PresenterState::Open(_))
    }

    pub async fn open(&mut self, user_id: UserId) -> Result<(), StoreError> {
        self.state = PresenterState::Open(user_id);
        self.refresh().await
    }

    pub fn close(&mut self) {
        self.state = PresenterState::Closed;
    }

    pub async fn handle(&mut self, action: ListAction) -> Result<(), StoreError> {
        let PresenterState::Open(user_id) = self.state.clone() else {
            warn!(?action, "action received while the list is closed; ignoring");
            return Ok(());
        };

        match action {
            ListAction::Create => {
                self.store.create(&user_id, TodoPatch::default()).await?;
                self.refresh().await
            }
            ListAction::Delete(todo_id) => {
                let confirmed = self
                    .prompt
                    .confirm("Delete To-Do", "This cannot be undone. Delete anyway?")
                    .await;
                if !confirmed {
                    // Cancelled: no state change, no re-render.
                    return Ok(());
                }
                if !self.store.delete(&todo_id).await? {
                    warn!(%todo_id, "delete requested for a todo that no longer exists");
                }
                self.refresh().await
            }
            ListAction::Submit(patch) => {
                self.store.update_user_collection(&user_id, &patch).await?;
                if self.options.close_on_submit {
                    self.close();
                    Ok(())
                } else {
                    self.refresh().await
                }
            }
        }
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        let PresenterState::Open(user_id) = &self.state else {
            return Ok(());
        };
        let todos = self.store.get_collection(user_id).await?;
        info!(%user_id, count = todos.len(), "rendering todo list");
        self.view.render(user_id, &todos);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
