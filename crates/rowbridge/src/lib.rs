//! rowbridge: a typed-record persistence adapter.
//!
//! Application code declares record shapes as schema metadata, then drives
//! CRUD and batch operations through a [`Repository`]. The adapter
//! marshals typed records to and from a weakly-typed wire representation
//! and calls into an opaque persistence engine behind the
//! [`Engine`] trait; it executes no SQL and manages no storage of its own.
//!
//! # Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use rowbridge::{ColumnDef, Entity, EntityDef, Repository, SchemaRegistry};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct User {
//!     id: Option<i64>,
//!     name: Option<String>,
//!     email: Option<String>,
//! }
//!
//! impl Entity for User {
//!     fn shape_name() -> &'static str {
//!         "User"
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> rowbridge::Result<()> {
//! let registry = SchemaRegistry::new();
//! registry.register(
//!     EntityDef::new("User")
//!         .column(ColumnDef::primary_key("id"))
//!         .column(ColumnDef::new::<String>("name").not_null())
//!         .column(ColumnDef::new::<String>("email").unique()),
//! )?;
//!
//! let repo: Repository<User> = Repository::with_default_connection(&registry)?;
//! let saved = repo
//!     .save(User {
//!         id: None,
//!         name: Some("Alice".into()),
//!         email: Some("a@x.com".into()),
//!     })
//!     .await?;
//! assert!(saved.id.is_some());
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
mod error;
mod marshal;
mod repository;

pub mod engine;

pub use config::ConnectionConfig;
pub use connection::{
    default_connection, set_default_connection, Connection, Connector, DefaultConnector,
};
pub use error::{Error, Result};
pub use marshal::Marshaller;
pub use repository::{Patch, Repository};

// Re-export the contract layer so most callers only need this crate.
pub use rowbridge_core::engine::{Engine, EngineError, SchemaDescriptor, WireRecord, WireValue};
pub use rowbridge_core::schema::{
    ColumnDef, ColumnSpec, ColumnType, EntityDef, EntityMetadata, SchemaError, SchemaRegistry,
};
pub use rowbridge_core::Entity;
