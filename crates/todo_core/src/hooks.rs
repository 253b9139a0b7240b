use futures::future::BoxFuture;
use tracing::error;

use shared::domain::UserId;

/// Lifecycle signals delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Init,
    Ready,
    UserListRendered { user_id: UserId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEventKind {
    Init,
    Ready,
    UserListRendered,
}

impl HostEvent {
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::Init => HostEventKind::Init,
            HostEvent::Ready => HostEventKind::Ready,
            HostEvent::UserListRendered { .. } => HostEventKind::UserListRendered,
        }
    }
}

pub type HookFn = Box<dyn FnMut(HostEvent) -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// Dependency-injected dispatcher for host lifecycle callbacks; no global
/// registry. Callbacks registered for the same event run in registration
/// order. A failing callback is logged and does not stop the rest.
#[derive(Default)]
pub struct HookBus {
    hooks: Vec<(HostEventKind, HookFn)>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: HostEventKind, hook: HookFn) {
        self.hooks.push((kind, hook));
    }

    pub async fn emit(&mut self, event: HostEvent) {
        for (kind, hook) in &mut self.hooks {
            if *kind != event.kind() {
                continue;
            }
            if let Err(err) = hook(event.clone()).await {
                error!(?event, "hook callback failed: {err:#}");
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
