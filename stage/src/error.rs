//! Engine error types.
//!
//! Only [`EngineError::Scheduler`] is fatal to the tick loop. Everything else is
//! rejected synchronously at the call site or, for listener callbacks, logged
//! and skipped so the rest of the pass keeps running.

/// Error returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid setup: density ≤ 0, duplicate body binding, duplicate listener.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An asynchronous resource failed to load.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// Operation on a destroyed or unknown object, or a stale snapshot.
    #[error("state error: {0}")]
    State(String),
    /// The paint surface backend rejected an operation.
    #[error("surface error: {0}")]
    Surface(String),
    /// The scheduler could not re-arm the next tick.
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

/// Failure of an asynchronous resource load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("resource not found: {url}")]
    NotFound { url: String },
    #[error("resource unreadable: {url}: {reason}")]
    Unreadable { url: String, reason: String },
}

/// Error type returned by user-supplied listener callbacks.
pub type ListenerError = Box<dyn std::error::Error>;

/// Result type returned by user-supplied listener callbacks.
pub type ListenerResult = Result<(), ListenerError>;
