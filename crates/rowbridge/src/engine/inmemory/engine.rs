use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use rowbridge_core::engine::{Engine, EngineError, Result, SchemaDescriptor, WireRecord};

use crate::config::ConnectionConfig;
use crate::connection::Connector;

/// Rows for one shape, keyed by generated id.
#[derive(Debug, Default)]
struct Table {
    primary_key: String,
    rows: BTreeMap<i64, WireRecord>,
    next_id: i64,
}

#[derive(Debug, Default)]
struct State {
    schemas: HashMap<String, SchemaDescriptor>,
    tables: HashMap<String, Table>,
}

impl State {
    fn primary_key_of(&self, shape: &str) -> String {
        self.schemas
            .get(shape)
            .map(|schema| schema.primary_key.clone())
            .unwrap_or_else(|| "id".to_string())
    }
}

/// In-memory engine.
///
/// Clones share the same store, so a test can keep a handle to the engine
/// it wired into a connection. Batch operations are implemented for real;
/// [`without_batch`](InMemoryEngine::without_batch) builds an engine that
/// reports them as unsupported so fallback paths stay testable.
///
/// Missing-id `update` and `delete` succeed silently: the engine does not
/// synthesize not-found signals.
#[derive(Debug, Clone)]
pub struct InMemoryEngine {
    state: Arc<RwLock<State>>,
    batch: bool,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            batch: true,
        }
    }

    /// An engine identical to [`new`](InMemoryEngine::new) except that
    /// every batch operation reports [`EngineError::Unsupported`].
    pub fn without_batch() -> Self {
        Self {
            batch: false,
            ..Self::new()
        }
    }

    /// Number of stored rows for a shape.
    pub async fn row_count(&self, shape: &str) -> usize {
        self.state
            .read()
            .await
            .tables
            .get(shape)
            .map(|table| table.rows.len())
            .unwrap_or(0)
    }

    fn insert_row(state: &mut State, shape: &str, record: WireRecord) -> i64 {
        let primary_key = state.primary_key_of(shape);
        let table = state.tables.entry(shape.to_string()).or_default();
        table.primary_key = primary_key;

        table.next_id += 1;
        let id = table.next_id;

        let mut row = record;
        row.insert(table.primary_key.clone(), Value::from(id));
        table.rows.insert(id, row);
        id
    }

    fn parse_id(id: &str) -> Option<i64> {
        id.parse::<i64>().ok()
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for InMemoryEngine {
    async fn register_schema(&self, schema: &SchemaDescriptor) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .schemas
            .insert(schema.shape.clone(), schema.clone());
        Ok(())
    }

    async fn create(&self, shape: &str, record: WireRecord) -> Result<i64> {
        let mut state = self.state.write().await;
        Ok(Self::insert_row(&mut state, shape, record))
    }

    fn supports_batch(&self) -> bool {
        self.batch
    }

    async fn create_batch(&self, shape: &str, records: Vec<WireRecord>) -> Result<Vec<i64>> {
        if !self.batch {
            return Err(EngineError::Unsupported {
                operation: "create_batch",
            });
        }
        let mut state = self.state.write().await;
        Ok(records
            .into_iter()
            .map(|record| Self::insert_row(&mut state, shape, record))
            .collect())
    }

    async fn find_by_id(&self, shape: &str, id: &str) -> Result<Option<WireRecord>> {
        let Some(id) = Self::parse_id(id) else {
            return Ok(None);
        };
        let state = self.state.read().await;
        Ok(state
            .tables
            .get(shape)
            .and_then(|table| table.rows.get(&id))
            .cloned())
    }

    async fn find_all(&self, shape: &str) -> Result<Vec<WireRecord>> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .get(shape)
            .map(|table| table.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn update(&self, shape: &str, id: &str, patch: WireRecord) -> Result<()> {
        let Some(id) = Self::parse_id(id) else {
            return Ok(());
        };
        let mut state = self.state.write().await;
        if let Some(row) = state
            .tables
            .get_mut(shape)
            .and_then(|table| table.rows.get_mut(&id))
        {
            for (column, value) in patch {
                row.insert(column, value);
            }
        }
        Ok(())
    }

    async fn update_batch(&self, shape: &str, updates: Vec<(String, WireRecord)>) -> Result<()> {
        if !self.batch {
            return Err(EngineError::Unsupported {
                operation: "update_batch",
            });
        }
        for (id, patch) in updates {
            self.update(shape, &id, patch).await?;
        }
        Ok(())
    }

    async fn delete(&self, shape: &str, id: &str) -> Result<()> {
        let Some(id) = Self::parse_id(id) else {
            return Ok(());
        };
        let mut state = self.state.write().await;
        if let Some(table) = state.tables.get_mut(shape) {
            table.rows.remove(&id);
        }
        Ok(())
    }

    async fn delete_batch(&self, shape: &str, ids: Vec<String>) -> Result<()> {
        if !self.batch {
            return Err(EngineError::Unsupported {
                operation: "delete_batch",
            });
        }
        for id in ids {
            self.delete(shape, &id).await?;
        }
        Ok(())
    }

    async fn create_table(&self, shape: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let primary_key = state.primary_key_of(shape);
        let table = state.tables.entry(shape.to_string()).or_default();
        if table.primary_key.is_empty() {
            table.primary_key = primary_key;
        }
        Ok(())
    }

    async fn drop_table(&self, shape: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.tables.remove(shape);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Connector producing [`InMemoryEngine`] handles.
///
/// By default every `open` call produces a fresh, empty store;
/// [`shared`](InMemoryConnector::shared) hands out clones of one engine
/// instead so a reconnect sees the same data.
#[derive(Debug, Clone)]
pub struct InMemoryConnector {
    engine: Option<InMemoryEngine>,
    batch: bool,
}

impl Default for InMemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self {
            engine: None,
            batch: true,
        }
    }

    /// Fresh engines without batch support, for exercising fallback
    /// paths.
    pub fn without_batch() -> Self {
        Self {
            engine: None,
            batch: false,
        }
    }

    /// Hand out clones of one shared engine.
    pub fn shared(engine: InMemoryEngine) -> Self {
        Self {
            engine: Some(engine),
            batch: true,
        }
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn open(
        &self,
        _config: &ConnectionConfig,
    ) -> std::result::Result<Arc<dyn Engine>, EngineError> {
        let engine = match &self.engine {
            Some(engine) => engine.clone(),
            None if self.batch => InMemoryEngine::new(),
            None => InMemoryEngine::without_batch(),
        };
        Ok(Arc::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> WireRecord {
        let mut wire = WireRecord::new();
        wire.insert("name".to_string(), json!(name));
        wire
    }

    #[tokio::test]
    async fn test_create_assigns_monotone_ids_and_stamps_the_key() {
        let engine = InMemoryEngine::new();
        let first = engine.create("User", record("a")).await.unwrap();
        let second = engine.create("User", record("b")).await.unwrap();
        assert_eq!((first, second), (1, 2));

        let row = engine.find_by_id("User", "1").await.unwrap().unwrap();
        assert_eq!(row.get("id").unwrap(), &json!(1));
        assert_eq!(row.get("name").unwrap(), &json!("a"));
    }

    #[tokio::test]
    async fn test_registered_primary_key_column_is_used() {
        let engine = InMemoryEngine::new();
        engine
            .register_schema(&SchemaDescriptor {
                shape: "Account".to_string(),
                table_name: "account".to_string(),
                columns: BTreeMap::new(),
                primary_key: "account_id".to_string(),
                auto_increment: vec!["account_id".to_string()],
            })
            .await
            .unwrap();

        engine.create("Account", WireRecord::new()).await.unwrap();
        let row = engine.find_by_id("Account", "1").await.unwrap().unwrap();
        assert_eq!(row.get("account_id").unwrap(), &json!(1));
    }

    #[tokio::test]
    async fn test_find_by_id_misses_return_none() {
        let engine = InMemoryEngine::new();
        assert!(engine.find_by_id("User", "99").await.unwrap().is_none());
        assert!(engine
            .find_by_id("User", "not-an-id")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_of_missing_ids_succeed_silently() {
        let engine = InMemoryEngine::new();
        engine.update("User", "42", record("x")).await.unwrap();
        engine.delete("User", "42").await.unwrap();
    }

    #[tokio::test]
    async fn test_without_batch_reports_unsupported() {
        let engine = InMemoryEngine::without_batch();
        assert!(!engine.supports_batch());

        let err = engine
            .create_batch("User", vec![record("a")])
            .await
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[tokio::test]
    async fn test_batch_create_matches_individual_ids() {
        let engine = InMemoryEngine::new();
        let ids = engine
            .create_batch("User", vec![record("a"), record("b"), record("c")])
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(engine.row_count("User").await, 3);
    }

    #[tokio::test]
    async fn test_drop_table_discards_rows() {
        let engine = InMemoryEngine::new();
        engine.create("User", record("a")).await.unwrap();
        engine.drop_table("User").await.unwrap();
        assert_eq!(engine.row_count("User").await, 0);
        assert!(engine.find_all("User").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_the_store() {
        let engine = InMemoryEngine::new();
        let clone = engine.clone();
        engine.create("User", record("a")).await.unwrap();
        assert_eq!(clone.row_count("User").await, 1);
    }
}
