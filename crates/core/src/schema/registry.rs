use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use super::error::Result;
use super::metadata::{EntityDef, EntityMetadata};

static GLOBAL: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::new);

/// Store of registered shape metadata, keyed by shape name.
///
/// Cloning is cheap and shares the underlying store. Entries live for the
/// process lifetime. Re-registering a shape name overwrites its entry:
/// last declaration wins, and concurrent registration of the *same* shape
/// from multiple threads is the caller's responsibility to avoid.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    shapes: Arc<RwLock<HashMap<String, Arc<EntityMetadata>>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry, lazily constructed on first
    /// access.
    pub fn global() -> &'static SchemaRegistry {
        &GLOBAL
    }

    /// Extract and store metadata for a shape declaration.
    ///
    /// Pure metadata work: no engine I/O happens here and registration
    /// succeeds without a live connection.
    pub fn register(&self, def: EntityDef) -> Result<Arc<EntityMetadata>> {
        let metadata = Arc::new(def.build()?);
        self.shapes
            .write()
            .expect("schema registry lock poisoned")
            .insert(metadata.shape().to_string(), Arc::clone(&metadata));
        Ok(metadata)
    }

    pub fn lookup(&self, shape: &str) -> Option<Arc<EntityMetadata>> {
        self.shapes
            .read()
            .expect("schema registry lock poisoned")
            .get(shape)
            .cloned()
    }

    /// Names of every registered shape.
    pub fn registered_shapes(&self) -> Vec<String> {
        self.shapes
            .read()
            .expect("schema registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDef;

    #[test]
    fn test_register_then_lookup() {
        let registry = SchemaRegistry::new();
        registry
            .register(EntityDef::new("User").column(ColumnDef::primary_key("id")))
            .unwrap();

        let metadata = registry.lookup("User").unwrap();
        assert_eq!(metadata.shape(), "User");
        assert_eq!(metadata.primary_key(), "id");
    }

    #[test]
    fn test_lookup_unknown_shape_is_none() {
        let registry = SchemaRegistry::new();
        assert!(registry.lookup("Ghost").is_none());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let registry = SchemaRegistry::new();
        registry
            .register(EntityDef::new("User").table("users_v1"))
            .unwrap();
        registry
            .register(EntityDef::new("User").table("users_v2"))
            .unwrap();

        assert_eq!(registry.lookup("User").unwrap().table_name(), "users_v2");
    }

    #[test]
    fn test_shapes_do_not_interfere() {
        let registry = SchemaRegistry::new();
        registry.register(EntityDef::new("User")).unwrap();
        registry.register(EntityDef::new("Post")).unwrap();

        let user = registry.lookup("User").unwrap();
        let post = registry.lookup("Post").unwrap();
        assert_ne!(user.table_name(), post.table_name());
    }

    #[test]
    fn test_clones_share_the_store() {
        let registry = SchemaRegistry::new();
        let clone = registry.clone();
        registry.register(EntityDef::new("User")).unwrap();
        assert!(clone.lookup("User").is_some());
    }
}
