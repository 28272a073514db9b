use rowbridge_core::engine::EngineError;
use rowbridge_core::schema::SchemaError;
use thiserror::Error;

/// Errors surfaced by the adapter's public operations.
///
/// Every variant carries enough context (shape name, operation) to diagnose
/// a failure without inspecting engine internals.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Shape metadata is missing or invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Establishing or probing the connection failed.
    #[error("connection failed: {reason}")]
    Connection { reason: String },
    /// An operation was attempted while disconnected and lazy connect
    /// itself failed.
    #[error("not connected: {reason}")]
    NotConnected { reason: String },
    /// A record failed adapter-side validation before reaching the engine.
    #[error("validation failed for {shape}: {reason}")]
    Validation { shape: String, reason: String },
    /// The engine reported a failure while executing an operation.
    #[error("{operation} failed for {shape}: {source}")]
    Persistence {
        shape: String,
        operation: &'static str,
        source: EngineError,
    },
    /// Wire encode/decode failure.
    #[error("serialization failed for {shape}: {reason}")]
    Serialization { shape: String, reason: String },
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;
