//! In-memory engine backend.
//!
//! Keeps every shape's rows in process memory. Nothing is persisted and
//! the data dies with the engine handle, which makes it the backend of
//! choice for tests and local development.

mod engine;

pub use engine::{InMemoryConnector, InMemoryEngine};
