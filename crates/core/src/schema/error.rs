use thiserror::Error;

/// Errors raised while declaring or resolving shape metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("shape not registered: {shape} (declare it before constructing a repository)")]
    NotRegistered { shape: String },
    #[error("shape {shape} declares more than one primary key: {first} and {second}")]
    DuplicatePrimaryKey {
        shape: String,
        first: String,
        second: String,
    },
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
