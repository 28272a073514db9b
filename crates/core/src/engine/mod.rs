//! The engine call boundary.
//!
//! Every persistence engine reachable from the adapter implements
//! [`Engine`]: a narrow, weakly-typed operation set over wire-level
//! records. Results are normalized to `Result<T, EngineError>` at this
//! boundary so nothing downstream ever sees backend-specific response
//! shapes.

mod error;
mod traits;
mod wire;

pub use error::{EngineError, Result};
pub use traits::Engine;
pub use wire::{SchemaDescriptor, WireRecord, WireValue};
