//! Error taxonomy for compliment operations.

use std::path::PathBuf;

/// Failure of a backing-store read or write.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode stored state: {0}")]
    Decode(String),
}

/// Outcome of a rejected compliment operation.
///
/// Everything except `Persistence` is an expected, locally recovered
/// condition that the caller answers with a human-readable reply.
#[derive(Debug, thiserror::Error)]
pub enum ComplimentError {
    #[error("text is empty or starts with the command prefix")]
    InvalidInput,
    #[error("no compliments in the queue")]
    Empty,
    #[error("command is reserved for the admin")]
    Unauthorized,
    #[error("persistence fault: {0}")]
    Persistence(#[from] PersistError),
}
