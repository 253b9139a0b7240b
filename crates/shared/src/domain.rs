use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of every opaque identifier in the system.
pub const ID_LEN: usize = 16;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Fresh 16-character id drawn from UUIDv4 hex. The id space is
            /// large enough that collisions are negligible, not impossible.
            pub fn generate() -> Self {
                let hex = Uuid::new_v4().simple().to_string();
                Self(hex[..ID_LEN].to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(TodoId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub label: String,
    pub is_done: bool,
    /// Owning user; immutable once assigned, like `id`.
    pub user_id: UserId,
}

/// Sparse update touching only the supplied fields. Doubles as the creation
/// draft, where absent fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoPatch {
    pub label: Option<String>,
    pub is_done: Option<bool>,
}

impl TodoPatch {
    pub fn label(value: impl Into<String>) -> Self {
        Self {
            label: Some(value.into()),
            is_done: None,
        }
    }

    pub fn done(value: bool) -> Self {
        Self {
            label: None,
            is_done: Some(value),
        }
    }
}

/// One user's to-do map. Insertion order carries no meaning.
pub type TodoCollection = HashMap<TodoId, TodoItem>;

/// Sparse bulk update over a collection: only the named entries are touched,
/// and within each entry only the supplied fields.
pub type CollectionPatch = HashMap<TodoId, TodoPatch>;
