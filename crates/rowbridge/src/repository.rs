//! The repository surface.
//!
//! A [`Repository`] binds one registered shape to one connection and
//! orchestrates registration-on-use, marshalling, and engine calls for
//! every CRUD and batch operation.

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use rowbridge_core::engine::{Engine, EngineError, WireRecord};
use rowbridge_core::schema::{EntityMetadata, SchemaError, SchemaRegistry};
use rowbridge_core::Entity;

use crate::connection::{default_connection, Connection};
use crate::error::{Error, Result};
use crate::marshal::Marshaller;

/// A partial update, keyed by attribute name.
///
/// Keys that are not declared columns of the shape are ignored.
pub type Patch = Map<String, Value>;

/// CRUD and batch operations for one registered shape over one
/// connection.
///
/// Stateless beyond its marshalling caches, which are derived once at
/// construction; a repository is safe to share across threads once built.
/// Every operation connects lazily first.
pub struct Repository<R: Entity> {
    metadata: Arc<EntityMetadata>,
    connection: Arc<Connection>,
    marshaller: Marshaller,
    _entity: PhantomData<fn() -> R>,
}

impl<R: Entity> Repository<R> {
    /// Bind to an explicit connection.
    ///
    /// Fails with [`SchemaError::NotRegistered`] when the shape has no
    /// metadata in `registry`.
    pub fn new(registry: &SchemaRegistry, connection: Arc<Connection>) -> Result<Self> {
        let metadata = registry
            .lookup(R::shape_name())
            .ok_or_else(|| SchemaError::NotRegistered {
                shape: R::shape_name().to_string(),
            })?;
        let marshaller = Marshaller::new(Arc::clone(&metadata));
        Ok(Self {
            metadata,
            connection,
            marshaller,
            _entity: PhantomData,
        })
    }

    /// Bind to the process-wide default connection as it is right now.
    ///
    /// Replacing the default later does not retarget this repository.
    pub fn with_default_connection(registry: &SchemaRegistry) -> Result<Self> {
        Self::new(registry, default_connection())
    }

    pub fn metadata(&self) -> &Arc<EntityMetadata> {
        &self.metadata
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    // ========================================================================
    // Write operations
    // ========================================================================

    /// Persist a new record and return it with the generated primary key
    /// written back.
    ///
    /// Not idempotent: every call creates a new row. A caller-supplied
    /// primary-key value is passed through on the wire; whether the
    /// engine treats that as an upsert is engine-specific and not
    /// promised here.
    pub async fn save(&self, record: R) -> Result<R> {
        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        let wire = self.marshaller.to_wire(&record, false)?;
        self.validate(&wire)?;

        let id = engine
            .create(self.shape(), wire)
            .await
            .map_err(|source| self.persistence("create", source))?;
        self.write_back_id(record, id)
    }

    /// Persist many records, populating every primary key.
    ///
    /// One marshalling pass, then a single batch-create call when the
    /// engine supports it. Any batch-path failure falls back to saving
    /// each record individually; batch is an optimization, never a
    /// correctness requirement, and the result is identical either way.
    /// Empty input returns empty without touching the engine.
    pub async fn save_batch(&self, records: Vec<R>) -> Result<Vec<R>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        let mut wires = Vec::with_capacity(records.len());
        for record in &records {
            let wire = self.marshaller.to_wire(record, false)?;
            self.validate(&wire)?;
            wires.push(wire);
        }

        if engine.supports_batch() {
            match engine.create_batch(self.shape(), wires).await {
                Ok(ids) if ids.len() == records.len() => {
                    return records
                        .into_iter()
                        .zip(ids)
                        .map(|(record, id)| self.write_back_id(record, id))
                        .collect();
                }
                Ok(ids) => {
                    tracing::warn!(
                        shape = %self.shape(),
                        expected = records.len(),
                        returned = ids.len(),
                        "batch create returned a mismatched id count; falling back to per-record saves"
                    );
                }
                Err(err) => {
                    tracing::debug!(
                        shape = %self.shape(),
                        error = %err,
                        "batch create failed; falling back to per-record saves"
                    );
                }
            }
        }

        let mut saved = Vec::with_capacity(records.len());
        for record in records {
            saved.push(self.save(record).await?);
        }
        Ok(saved)
    }

    /// Apply a partial update by primary key.
    ///
    /// The adapter does not distinguish "not found" from "updated":
    /// engines that signal a missing id do so as an engine failure
    /// (surfaced as [`Error::Persistence`]); others succeed silently.
    pub async fn update(&self, id: impl Display, patch: Patch) -> Result<()> {
        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        let wire = self.patch_to_wire(patch);
        engine
            .update(self.shape(), &id.to_string(), wire)
            .await
            .map_err(|source| self.persistence("update", source))
    }

    /// Update from a full record: the primary key is read from the
    /// record and every other populated column is sent.
    ///
    /// Fails with [`Error::Validation`] when the record carries no
    /// primary-key value.
    pub async fn update_record(&self, record: &R) -> Result<()> {
        let id = self.primary_key_value(record)?;
        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        let wire = self.marshaller.to_wire(record, true)?;
        engine
            .update(self.shape(), &id, wire)
            .await
            .map_err(|source| self.persistence("update", source))
    }

    /// Apply many partial updates, each addressed by primary key.
    ///
    /// Same degradation policy as [`save_batch`](Repository::save_batch):
    /// one engine call when batching is supported, per-item updates
    /// otherwise or on any batch failure.
    pub async fn update_batch(&self, updates: Vec<(String, Patch)>) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        let translated: Vec<(String, WireRecord)> = updates
            .into_iter()
            .map(|(id, patch)| (id, self.patch_to_wire(patch)))
            .collect();

        if engine.supports_batch() {
            match engine.update_batch(self.shape(), translated.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::debug!(
                        shape = %self.shape(),
                        error = %err,
                        "batch update failed; falling back to per-item updates"
                    );
                }
            }
        }

        for (id, wire) in translated {
            engine
                .update(self.shape(), &id, wire)
                .await
                .map_err(|source| self.persistence("update", source))?;
        }
        Ok(())
    }

    /// Delete by primary key. Idempotent from the adapter's perspective;
    /// see [`update`](Repository::update) for the not-found policy.
    pub async fn delete(&self, id: impl Display) -> Result<()> {
        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        engine
            .delete(self.shape(), &id.to_string())
            .await
            .map_err(|source| self.persistence("delete", source))
    }

    /// Delete many records by primary key, degrading to per-item deletes
    /// when the engine cannot batch.
    pub async fn delete_batch(&self, ids: Vec<String>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        if engine.supports_batch() {
            match engine.delete_batch(self.shape(), ids.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::debug!(
                        shape = %self.shape(),
                        error = %err,
                        "batch delete failed; falling back to per-item deletes"
                    );
                }
            }
        }

        for id in ids {
            engine
                .delete(self.shape(), &id)
                .await
                .map_err(|source| self.persistence("delete", source))?;
        }
        Ok(())
    }

    // ========================================================================
    // Read operations
    // ========================================================================

    /// Fetch one record by primary key; `Ok(None)` when there is no
    /// match.
    pub async fn find_by_id(&self, id: impl Display) -> Result<Option<R>> {
        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        let row = engine
            .find_by_id(self.shape(), &id.to_string())
            .await
            .map_err(|source| self.persistence("find_by_id", source))?;
        match row {
            Some(wire) => Ok(Some(self.marshaller.from_wire(&wire)?)),
            None => Ok(None),
        }
    }

    /// Fetch every record of the shape.
    ///
    /// Each row decodes independently, but one decode fault fails the
    /// whole call: a partially dropped result set must never look
    /// complete.
    pub async fn find_all(&self) -> Result<Vec<R>> {
        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        let rows = engine
            .find_all(self.shape())
            .await
            .map_err(|source| self.persistence("find_all", source))?;
        rows.iter()
            .map(|wire| self.marshaller.from_wire(wire))
            .collect()
    }

    // ========================================================================
    // Table management
    // ========================================================================

    /// Ask the engine to materialize the backing table for this shape.
    pub async fn create_table(&self) -> Result<()> {
        let engine = self.engine().await?;
        self.ensure_registered(engine.as_ref()).await;

        engine
            .create_table(self.shape())
            .await
            .map_err(|source| self.persistence("create_table", source))
    }

    /// Ask the engine to drop the backing table for this shape.
    pub async fn drop_table(&self) -> Result<()> {
        let engine = self.engine().await?;
        engine
            .drop_table(self.shape())
            .await
            .map_err(|source| self.persistence("drop_table", source))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn shape(&self) -> &'static str {
        R::shape_name()
    }

    /// Lazily connect, then hand out the engine.
    async fn engine(&self) -> Result<Arc<dyn Engine>> {
        if !self.connection.is_connected().await {
            self.connection
                .connect()
                .await
                .map_err(|err| Error::NotConnected {
                    reason: err.to_string(),
                })?;
        }
        self.connection.engine().await
    }

    /// Best-effort schema registration with the engine.
    ///
    /// Failures are logged and swallowed: registration is idempotent and
    /// expected to have already succeeded, so a transient fault here must
    /// never block an operation the engine can still accept.
    async fn ensure_registered(&self, engine: &dyn Engine) {
        if let Err(err) = engine.register_schema(&self.metadata.descriptor()).await {
            tracing::warn!(
                shape = %self.shape(),
                error = %err,
                "schema registration failed; continuing"
            );
        }
    }

    /// Reject wire records missing a declared NOT NULL column, unless the
    /// engine generates or defaults it.
    fn validate(&self, wire: &WireRecord) -> Result<()> {
        for spec in self.metadata.columns().values() {
            if spec.nullable || spec.auto_increment || spec.default.is_some() {
                continue;
            }
            if !wire.contains_key(&spec.name) {
                return Err(Error::Validation {
                    shape: self.shape().to_string(),
                    reason: format!(
                        "column {} is not nullable but no value was provided",
                        spec.name
                    ),
                });
            }
        }
        Ok(())
    }

    fn patch_to_wire(&self, patch: Patch) -> WireRecord {
        let mut wire = WireRecord::new();
        for (attribute, value) in patch {
            if let Some(column) = self.marshaller.column_for(&attribute) {
                wire.insert(column.to_string(), value);
            }
        }
        wire
    }

    /// The record's primary-key value in the engine's identifier form.
    fn primary_key_value(&self, record: &R) -> Result<String> {
        let fields = match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(Error::Serialization {
                    shape: self.shape().to_string(),
                    reason: "record did not serialize to a mapping".to_string(),
                })
            }
            Err(err) => {
                return Err(Error::Serialization {
                    shape: self.shape().to_string(),
                    reason: err.to_string(),
                })
            }
        };

        match fields.get(self.metadata.primary_key()) {
            None | Some(Value::Null) => Err(Error::Validation {
                shape: self.shape().to_string(),
                reason: "record carries no primary-key value".to_string(),
            }),
            Some(value) => Ok(wire_id(value)),
        }
    }

    fn write_back_id(&self, record: R, id: i64) -> Result<R> {
        let mut fields = match serde_json::to_value(&record) {
            Ok(Value::Object(fields)) => fields,
            _ => {
                return Err(Error::Serialization {
                    shape: self.shape().to_string(),
                    reason: "record did not serialize to a mapping".to_string(),
                })
            }
        };
        fields.insert(self.metadata.primary_key().to_string(), Value::from(id));
        serde_json::from_value(Value::Object(fields)).map_err(|err| Error::Serialization {
            shape: self.shape().to_string(),
            reason: err.to_string(),
        })
    }

    fn persistence(&self, operation: &'static str, source: EngineError) -> Error {
        Error::Persistence {
            shape: self.shape().to_string(),
            operation,
            source,
        }
    }
}

/// Render a primary-key value as the engine's string identifier form.
fn wire_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
