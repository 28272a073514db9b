use thiserror::Error;

/// Failures reported across the engine boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine does not implement this operation. Optional capabilities
    /// (batching, table management) report this instead of failing hard so
    /// callers can fall back.
    #[error("operation not supported by this engine: {operation}")]
    Unsupported { operation: &'static str },
    /// The engine executed the operation and reported a failure.
    #[error("engine failure: {0}")]
    Backend(String),
    /// The engine could not be reached.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
