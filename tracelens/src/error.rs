//! Error types for the TraceLens SDK

use thiserror::Error;

/// Result type for SDK operations
pub type LensResult<T> = Result<T, LensError>;

/// Errors that can occur inside the SDK pipeline
///
/// None of these ever surface through `log`/`trace`: the emit path skips
/// when uninitialized, and delivery failures are absorbed at the queue.
#[derive(Error, Debug)]
pub enum LensError {
    /// Configuration accessed before init
    #[error("TraceLens not initialized. Call init() first.")]
    NotInitialized,

    /// Network-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the batch
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),
}
