use thiserror::Error;

use crate::domain::UserId;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced user does not resolve against the directory.
    #[error("unknown user '{0}'")]
    UnknownUser(UserId),
    /// The persistence backend rejected a read or write.
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}
