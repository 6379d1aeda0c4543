//! Error types for the local cache, the remote store and the sync layer.

use thiserror::Error;

/// Failure of a local key-value backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure talking to the remote note store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not signed in")]
    Unauthorized,

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// A save whose local commit did not complete.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("could not write notes locally: {0}")]
    Local(#[from] StoreError),
}

/// Rejected custom-tag edits.
#[derive(Error, Debug)]
pub enum TagError {
    #[error("Please enter a label name")]
    NameRequired,

    #[error("Label name already exists")]
    DuplicateName,

    #[error(transparent)]
    Storage(#[from] StoreError),
}
