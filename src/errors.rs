use std::io;

use thiserror::Error;

/// Error type for upload parsing, share-token decoding, and persistence failures.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Upload bytes could not be read as a spreadsheet.
    #[error("failed to parse upload: {0}")]
    Parse(String),
    /// Share token or legacy payload could not be decoded to JSON.
    #[error("malformed share token: {0}")]
    Decode(String),
    /// Decoded JSON is not an array of product records.
    #[error("shared payload is not a list of product records: {0}")]
    Schema(String),
    /// The persistence backend failed or is out of space.
    #[error("local storage unavailable: {0}")]
    Storage(String),
    /// Token exceeds the configured size cap.
    #[error("share token is {len} characters long, exceeding the configured limit of {limit}")]
    TokenTooLarge {
        /// Token length in characters.
        len: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Invalid input such as an unknown namespace, lesson, or URL.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TransferError {
    /// True for failures that only affect durability, never the current session.
    pub fn is_storage(&self) -> bool {
        matches!(self, TransferError::Storage(_))
    }
}
