use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::{TodoCollection, TodoId, TodoPatch, UserId};
use storage::Storage;
use todo_core::{
    ConfirmPrompt, HookBus, HostEvent, HostEventKind, ListPresenter, ListView, PresenterOptions,
    TodoStore,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

mod config;

use config::{load_settings, Settings};

const TOOL_NAME: &str = "vtt-todo";

#[derive(Parser, Debug)]
#[command(name = "vtt-todo", about = "Per-user to-do lists over flag storage")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a user in the directory.
    UserAdd { username: String },
    /// Open a user's list through the presenter (runs the host lifecycle).
    Show { username: String },
    /// Create a to-do for a user.
    Add { username: String, label: String },
    /// Flip the completion flag on a to-do.
    Toggle { todo_id: String },
    /// Delete a to-do (asks for confirmation unless --yes).
    Rm {
        todo_id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Print the aggregate view across all users.
    List,
    /// Exchange the configured refresh token for an access token.
    Token,
}

struct TerminalView;

impl ListView for TerminalView {
    fn render(&self, user_id: &UserId, todos: &TodoCollection) {
        println!("to-dos for {user_id}:");
        if todos.is_empty() {
            println!("  (none)");
            return;
        }
        let mut items: Vec<_> = todos.values().collect();
        items.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        for item in items {
            let mark = if item.is_done { "x" } else { " " };
            println!("  [{mark}] {}  {}", item.id, item.label);
        }
    }
}

struct TerminalPrompt {
    assume_yes: bool,
}

#[async_trait::async_trait]
impl ConfirmPrompt for TerminalPrompt {
    async fn confirm(&self, title: &str, content: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        println!("{title}: {content} [y/N]");
        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
            line
        })
        .await
        .unwrap_or_default();
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = load_settings();

    match args.command {
        Command::Token => {
            let refresh_token = settings.refresh_token.clone().context(
                "no refresh token configured; set refresh_token in vtt-todo.toml or VTT_TODO_REFRESH_TOKEN",
            )?;
            let client = herolab_client::HeroLabClient::new(&settings.herolab_base_url, TOOL_NAME);
            let token = client.acquire_access_token(&refresh_token).await?;
            println!("{token}");
            Ok(())
        }
        command => {
            let storage = Storage::new(&settings.database_url).await?;
            let store = TodoStore::new(Arc::new(storage.clone()));
            run_command(command, &settings, storage, store).await
        }
    }
}

async fn run_command(
    command: Command,
    settings: &Settings,
    storage: Storage,
    store: TodoStore,
) -> Result<()> {
    match command {
        Command::Token => unreachable!("handled before storage setup"),
        Command::UserAdd { username } => {
            let user_id = storage.create_user(&username).await?;
            println!("{username} -> {user_id}");
        }
        Command::Show { username } => {
            let user_id = resolve_user(&storage, &username).await?;
            show_list(settings, store, user_id).await;
        }
        Command::Add { username, label } => {
            let user_id = resolve_user(&storage, &username).await?;
            let item = store.create(&user_id, TodoPatch::label(label)).await?;
            println!("created {} for {username}", item.id);
        }
        Command::Toggle { todo_id } => {
            let todo_id = TodoId::from(todo_id.as_str());
            let aggregate = store.get_aggregate().await?;
            match aggregate.get(&todo_id) {
                Some(item) => {
                    let next = !item.is_done;
                    store.update(&todo_id, TodoPatch::done(next)).await?;
                    println!("{todo_id} -> {}", if next { "done" } else { "open" });
                }
                None => warn!(%todo_id, "no such todo"),
            }
        }
        Command::Rm { todo_id, yes } => {
            let prompt = TerminalPrompt { assume_yes: yes };
            let confirmed = prompt
                .confirm("Delete To-Do", "This cannot be undone. Delete anyway?")
                .await;
            if !confirmed {
                return Ok(());
            }
            let todo_id = TodoId::from(todo_id.as_str());
            if store.delete(&todo_id).await? {
                println!("deleted {todo_id}");
            } else {
                warn!(%todo_id, "no such todo");
            }
        }
        Command::List => {
            let aggregate = store.get_aggregate().await?;
            if aggregate.is_empty() {
                println!("(no to-dos)");
                return Ok(());
            }
            let mut items: Vec<_> = aggregate.values().collect();
            items.sort_by(|a, b| {
                (a.user_id.as_str(), a.id.as_str()).cmp(&(b.user_id.as_str(), b.id.as_str()))
            });
            for item in items {
                let owner = storage
                    .username_for_user(&item.user_id)
                    .await?
                    .unwrap_or_else(|| item.user_id.to_string());
                let mark = if item.is_done { "x" } else { " " };
                println!("[{mark}] {}  {}  ({owner})", item.id, item.label);
            }
        }
    }
    Ok(())
}

/// Wires the host lifecycle the way the original module does: init logging,
/// an optional token exchange on ready, and the list opening when the user
/// list renders.
async fn show_list(settings: &Settings, store: TodoStore, user_id: UserId) {
    let presenter = Arc::new(Mutex::new(ListPresenter::new(
        store,
        Arc::new(TerminalView),
        Arc::new(TerminalPrompt { assume_yes: false }),
        PresenterOptions::default(),
    )));

    let mut hooks = HookBus::new();
    hooks.on(
        HostEventKind::Init,
        Box::new(|_event| {
            Box::pin(async {
                info!("module initialized");
                Ok(())
            })
        }),
    );

    if let Some(refresh_token) = settings.refresh_token.clone() {
        let base_url = settings.herolab_base_url.clone();
        hooks.on(
            HostEventKind::Ready,
            Box::new(move |_event| {
                let base_url = base_url.clone();
                let refresh_token = refresh_token.clone();
                Box::pin(async move {
                    let client = herolab_client::HeroLabClient::new(base_url, TOOL_NAME);
                    let token = client.acquire_access_token(&refresh_token).await?;
                    info!(token_len = token.len(), "Hero Lab access token acquired");
                    Ok(())
                })
            }),
        );
    }

    if settings.show_list_button {
        let presenter = presenter.clone();
        hooks.on(
            HostEventKind::UserListRendered,
            Box::new(move |event| {
                let presenter = presenter.clone();
                Box::pin(async move {
                    if let HostEvent::UserListRendered { user_id } = event {
                        presenter.lock().await.open(user_id).await?;
                    }
                    Ok(())
                })
            }),
        );
    } else {
        info!("list button injection disabled by settings");
    }

    hooks.emit(HostEvent::Init).await;
    hooks.emit(HostEvent::Ready).await;
    hooks.emit(HostEvent::UserListRendered { user_id }).await;
}

async fn resolve_user(storage: &Storage, username: &str) -> Result<UserId> {
    storage
        .user_id_for_username(username)
        .await?
        .with_context(|| {
            format!("unknown user '{username}'; run `vtt-todo user-add {username}` first")
        })
}
