use async_trait::async_trait;

use super::error::{EngineError, Result};
use super::wire::{SchemaDescriptor, WireRecord};

/// The persistence engine call boundary.
///
/// One handle per connection; the adapter issues exactly one awaited call
/// per operation and spawns no background work. Implementations must be
/// `Send + Sync`, but safe concurrent use of a single handle is an
/// engine-level guarantee the adapter does not add to.
///
/// Batch and table-management operations are optional capabilities: the
/// default bodies report [`EngineError::Unsupported`], and
/// [`supports_batch`](Engine::supports_batch) makes batch absence
/// detectable without an error path.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Register shape metadata with the engine. Idempotent engine-side.
    async fn register_schema(&self, schema: &SchemaDescriptor) -> Result<()>;

    /// Persist one record and return its generated id.
    async fn create(&self, shape: &str, record: WireRecord) -> Result<i64>;

    /// Whether [`create_batch`](Engine::create_batch) and friends are
    /// implemented.
    fn supports_batch(&self) -> bool {
        false
    }

    /// Persist many records in one call, returning generated ids in input
    /// order.
    async fn create_batch(&self, shape: &str, records: Vec<WireRecord>) -> Result<Vec<i64>> {
        let _ = (shape, records);
        Err(EngineError::Unsupported {
            operation: "create_batch",
        })
    }

    /// Fetch one record by primary key; `None` when there is no match.
    async fn find_by_id(&self, shape: &str, id: &str) -> Result<Option<WireRecord>>;

    /// Fetch every record of a shape.
    async fn find_all(&self, shape: &str) -> Result<Vec<WireRecord>>;

    /// Apply a partial update to the record with the given primary key.
    async fn update(&self, shape: &str, id: &str, patch: WireRecord) -> Result<()>;

    /// Apply many partial updates in one call.
    async fn update_batch(&self, shape: &str, updates: Vec<(String, WireRecord)>) -> Result<()> {
        let _ = (shape, updates);
        Err(EngineError::Unsupported {
            operation: "update_batch",
        })
    }

    /// Delete the record with the given primary key.
    async fn delete(&self, shape: &str, id: &str) -> Result<()>;

    /// Delete many records in one call.
    async fn delete_batch(&self, shape: &str, ids: Vec<String>) -> Result<()> {
        let _ = (shape, ids);
        Err(EngineError::Unsupported {
            operation: "delete_batch",
        })
    }

    /// Materialize the backing table for a registered shape.
    async fn create_table(&self, shape: &str) -> Result<()> {
        let _ = shape;
        Err(EngineError::Unsupported {
            operation: "create_table",
        })
    }

    /// Drop the backing table for a shape.
    async fn drop_table(&self, shape: &str) -> Result<()> {
        let _ = shape;
        Err(EngineError::Unsupported {
            operation: "drop_table",
        })
    }

    /// Liveness probe.
    async fn ping(&self) -> Result<()>;

    /// Release engine-side resources. Called at most once per handle.
    async fn close(&self) -> Result<()>;
}
