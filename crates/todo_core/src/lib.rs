pub mod flag_store;
pub mod hooks;
pub mod memory;
pub mod presenter;
pub mod store;

pub use flag_store::FlagStore;
pub use hooks::{HookBus, HostEvent, HostEventKind};
pub use memory::MemoryFlagStore;
pub use presenter::{ConfirmPrompt, ListAction, ListPresenter, ListView, PresenterOptions};
pub use store::TodoStore;
