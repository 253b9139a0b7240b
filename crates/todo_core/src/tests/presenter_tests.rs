use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use super::*;
use crate::memory::MemoryFlagStore;

#[derive(Default)]
struct RecordingView {
    // (user, item count) per render call.
    renders: Mutex<Vec<(UserId, usize)>>,
}

impl RecordingView {
    fn render_count(&self) -> usize {
        self.renders.lock().expect("view lock").len()
    }

    fn last(&self) -> (UserId, usize) {
        self.renders
            .lock()
            .expect("view lock")
            .last()
            .cloned()
            .expect("at least one render")
    }
}

impl ListView for RecordingView {
    fn render(&self, user_id: &UserId, todos: &TodoCollection) {
        self.renders
            .lock()
            .expect("view lock")
            .push((user_id.clone(), todos.len()));
    }
}

struct ScriptedPrompt {
    answer: bool,
    asked: AtomicUsize,
}

impl ScriptedPrompt {
    fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ConfirmPrompt for ScriptedPrompt {
    async fn confirm(&self, _title: &str, _content: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

async fn presenter_for(
    answer: bool,
    options: PresenterOptions,
) -> (
    ListPresenter,
    TodoStore,
    Arc<RecordingView>,
    Arc<ScriptedPrompt>,
    UserId,
) {
    let flags = Arc::new(MemoryFlagStore::new());
    let user_id = UserId::from("alice");
    flags.register_user(user_id.clone()).await;
    let store = TodoStore::new(flags);
    let view = Arc::new(RecordingView::default());
    let prompt = Arc::new(ScriptedPrompt::new(answer));
    let presenter = ListPresenter::new(store.clone(), view.clone(), prompt.clone(), options);
    (presenter, store, view, prompt, user_id)
}

#[tokio::test]
async fn open_renders_the_current_collection() {
    let (mut presenter, store, view, _, user_id) =
        presenter_for(true, PresenterOptions::default()).await;
    store
        .create(&user_id, TodoPatch::label("existing"))
        .await
        .expect("create");

    presenter.open(user_id.clone()).await.expect("open");

    assert!(presenter.is_open());
    assert_eq!(view.last(), (user_id, 1));
}

#[tokio::test]
async fn create_action_adds_an_item_and_rerenders() {
    let (mut presenter, store, view, _, user_id) =
        presenter_for(true, PresenterOptions::default()).await;
    presenter.open(user_id.clone()).await.expect("open");

    presenter.handle(ListAction::Create).await.expect("create");

    assert_eq!(view.render_count(), 2);
    assert_eq!(view.last(), (user_id.clone(), 1));
    assert_eq!(store.get_collection(&user_id).await.expect("coll").len(), 1);
}

#[tokio::test]
async fn cancelled_delete_changes_nothing() {
    let (mut presenter, store, view, prompt, user_id) =
        presenter_for(false, PresenterOptions::default()).await;
    let item = store
        .create(&user_id, TodoPatch::label("survivor"))
        .await
        .expect("create");
    presenter.open(user_id.clone()).await.expect("open");
    let renders_before = view.render_count();

    presenter
        .handle(ListAction::Delete(item.id.clone()))
        .await
        .expect("delete");

    assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    assert_eq!(view.render_count(), renders_before);
    assert!(store
        .get_collection(&user_id)
        .await
        .expect("coll")
        .contains_key(&item.id));
}

#[tokio::test]
async fn confirmed_delete_removes_and_rerenders() {
    let (mut presenter, store, view, _, user_id) =
        presenter_for(true, PresenterOptions::default()).await;
    let item = store
        .create(&user_id, TodoPatch::label("doomed"))
        .await
        .expect("create");
    presenter.open(user_id.clone()).await.expect("open");

    presenter
        .handle(ListAction::Delete(item.id.clone()))
        .await
        .expect("delete");

    assert_eq!(view.last(), (user_id.clone(), 0));
    assert!(store.get_collection(&user_id).await.expect("coll").is_empty());
}

#[tokio::test]
async fn submit_merges_and_keeps_the_form_open() {
    let (mut presenter, store, view, _, user_id) =
        presenter_for(true, PresenterOptions::default()).await;
    let item = store
        .create(&user_id, TodoPatch::label("toggle me"))
        .await
        .expect("create");
    presenter.open(user_id.clone()).await.expect("open");

    let patch = CollectionPatch::from([(item.id.clone(), TodoPatch::done(true))]);
    presenter
        .handle(ListAction::Submit(patch))
        .await
        .expect("submit");

    assert!(presenter.is_open());
    assert_eq!(view.render_count(), 2);
    let collection = store.get_collection(&user_id).await.expect("coll");
    assert!(collection.get(&item.id).expect("item").is_done);
    assert_eq!(collection.get(&item.id).expect("item").label, "toggle me");
}

#[tokio::test]
async fn submit_can_close_the_form_when_configured() {
    let (mut presenter, _, view, _, user_id) = presenter_for(
        true,
        PresenterOptions {
            close_on_submit: true,
        },
    )
    .await;
    presenter.open(user_id).await.expect("open");
    let renders_before = view.render_count();

    presenter
        .handle(ListAction::Submit(CollectionPatch::new()))
        .await
        .expect("submit");

    assert!(!presenter.is_open());
    assert_eq!(view.render_count(), renders_before);
}

#[tokio::test]
async fn actions_are_ignored_while_closed() {
    let (mut presenter, store, view, _, user_id) =
        presenter_for(true, PresenterOptions::default()).await;

    presenter.handle(ListAction::Create).await.expect("create");

    assert_eq!(view.render_count(), 0);
    assert!(store.get_collection(&user_id).await.expect("coll").is_empty());
}
