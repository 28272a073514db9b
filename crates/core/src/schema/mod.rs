//! Declarative schema metadata.
//!
//! Shapes are declared through the [`EntityDef`]/[`ColumnDef`] builders and
//! registered with a [`SchemaRegistry`], producing immutable
//! [`EntityMetadata`]. Registration is pure metadata extraction, with no
//! engine I/O, so shapes can be declared before any connection exists.

mod error;
mod metadata;
mod registry;
mod types;

pub use error::{Result, SchemaError};
pub use metadata::{ColumnDef, EntityDef, EntityMetadata};
pub use registry::SchemaRegistry;
pub use types::{ColumnSpec, ColumnType};
