use crate::api::ApiError;
use thiserror::Error;

/// Failures that stop a clone before any entity is copied
#[derive(Debug, Error)]
pub enum CloneError {
    /// No container in the account carries the requested public ID
    #[error("Container with public ID {public_id} does not exist in account {account_id}")]
    SourceContainerNotFound {
        public_id: String,
        account_id: String,
    },

    /// The container exists but the API listed no workspace for it
    #[error("Container {path} has no workspaces")]
    NoWorkspace { path: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}
