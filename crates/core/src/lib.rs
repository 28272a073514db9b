//! Core contracts for the rowbridge persistence adapter.
//!
//! `rowbridge_core` is the contract layer shared by the adapter and by
//! engine backends:
//!
//! - [`schema`]: declarative shape metadata: column specs, the engine
//!   type-token vocabulary, and the process-wide registry.
//! - [`engine`]: the narrow call boundary every persistence engine
//!   implements, together with the wire-level record representation.
//! - [`Entity`]: the binding between a Rust record type and its registered
//!   shape name.
//!
//! The adapter crate (`rowbridge`) builds the connection lifecycle,
//! marshalling, and repository surface on top of these contracts.

pub mod engine;
pub mod entity;
pub mod schema;

pub use entity::Entity;
