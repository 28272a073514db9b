//! Engine backends.
//!
//! In-tree backends are selected at compile time via feature flags; any
//! external engine plugs in through the [`Connector`](crate::Connector)
//! trait instead.

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "inmemory")]
pub use inmemory::{InMemoryConnector, InMemoryEngine};
