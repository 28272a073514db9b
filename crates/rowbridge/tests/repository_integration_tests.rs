//! End-to-end repository tests against the in-memory engine backend.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use rowbridge::engine::InMemoryConnector;
use rowbridge::{
    set_default_connection, ColumnDef, Connection, ConnectionConfig, Entity, EntityDef, Error,
    Patch, Repository, SchemaRegistry,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct User {
    id: Option<i64>,
    name: Option<String>,
    email: Option<String>,
    age: Option<i64>,
}

impl Entity for User {
    fn shape_name() -> &'static str {
        "User"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Post {
    id: Option<i64>,
    user_id: Option<i64>,
    title: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

impl Entity for Post {
    fn shape_name() -> &'static str {
        "Post"
    }
}

fn registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry
        .register(
            EntityDef::new("User")
                .table("users")
                .column(ColumnDef::primary_key("id"))
                .column(ColumnDef::new::<String>("name").not_null())
                .column(ColumnDef::new::<String>("email").unique())
                .column(ColumnDef::new::<i64>("age")),
        )
        .unwrap();
    registry
        .register(
            EntityDef::new("Post")
                .column(ColumnDef::primary_key("id"))
                .column(ColumnDef::new::<i64>("user_id"))
                .column(ColumnDef::new::<String>("title").not_null())
                .column(ColumnDef::new::<DateTime<Utc>>("published_at")),
        )
        .unwrap();
    registry
}

fn connection() -> Arc<Connection> {
    Arc::new(Connection::new(ConnectionConfig::default()))
}

fn connection_without_batch() -> Arc<Connection> {
    Arc::new(Connection::with_connector(
        ConnectionConfig::default(),
        Box::new(InMemoryConnector::without_batch()),
    ))
}

fn alice() -> User {
    User {
        id: None,
        name: Some("Alice".to_string()),
        email: Some("a@x.com".to_string()),
        age: Some(30),
    }
}

fn users(n: usize) -> Vec<User> {
    (0..n)
        .map(|i| User {
            id: None,
            name: Some(format!("User {i}")),
            email: Some(format!("user{i}@x.com")),
            age: Some(20 + i as i64),
        })
        .collect()
}

#[tokio::test]
async fn test_full_crud_scenario() {
    let registry = registry();
    let repo: Repository<User> = Repository::new(&registry, connection()).unwrap();

    // Save populates the generated primary key.
    let saved = repo.save(alice()).await.unwrap();
    let id = saved.id.expect("save must populate the primary key");

    // Read back by id.
    let found = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(found.name.as_deref(), Some("Alice"));
    assert_eq!(found.email.as_deref(), Some("a@x.com"));
    assert_eq!(found.age, Some(30));

    // Partial update by id.
    let mut patch = Patch::new();
    patch.insert("age".to_string(), json!(31));
    repo.update(id, patch).await.unwrap();
    assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().age, Some(31));

    // Delete, then the row is gone.
    repo.delete(id).await.unwrap();
    assert!(repo.find_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_id_miss_is_none_not_an_error() {
    let registry = registry();
    let repo: Repository<User> = Repository::new(&registry, connection()).unwrap();
    assert!(repo.find_by_id(12345).await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_batch_empty_makes_no_engine_calls() {
    let registry = registry();
    let conn = connection();
    let repo: Repository<User> = Repository::new(&registry, Arc::clone(&conn)).unwrap();

    let saved = repo.save_batch(Vec::new()).await.unwrap();
    assert!(saved.is_empty());
    // The connection was never even established.
    assert!(!conn.is_connected().await);
}

#[tokio::test]
async fn test_save_batch_populates_keys_with_and_without_batch_support() {
    let registry = registry();

    let with_batch: Repository<User> = Repository::new(&registry, connection()).unwrap();
    let without_batch: Repository<User> =
        Repository::new(&registry, connection_without_batch()).unwrap();

    let fast = with_batch.save_batch(users(5)).await.unwrap();
    let slow = without_batch.save_batch(users(5)).await.unwrap();

    assert_eq!(fast, slow);
    for (i, user) in fast.iter().enumerate() {
        assert_eq!(user.id, Some(i as i64 + 1));
    }
}

#[tokio::test]
async fn test_update_record_sends_everything_but_the_key() {
    let registry = registry();
    let repo: Repository<User> = Repository::new(&registry, connection()).unwrap();

    let mut saved = repo.save(alice()).await.unwrap();
    saved.age = Some(44);
    repo.update_record(&saved).await.unwrap();

    let found = repo.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(found.age, Some(44));
    assert_eq!(found.name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_update_record_without_key_is_a_validation_error() {
    let registry = registry();
    let repo: Repository<User> = Repository::new(&registry, connection()).unwrap();

    let err = repo.update_record(&alice()).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_save_rejects_missing_not_null_column() {
    let registry = registry();
    let repo: Repository<User> = Repository::new(&registry, connection()).unwrap();

    let err = repo
        .save(User {
            email: Some("anon@x.com".to_string()),
            ..User::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_update_batch_parity_across_engine_paths() {
    let registry = registry();

    for conn in [connection(), connection_without_batch()] {
        let repo: Repository<User> = Repository::new(&registry, conn).unwrap();
        let saved = repo.save_batch(users(3)).await.unwrap();

        let updates = saved
            .iter()
            .map(|user| {
                let mut patch = Patch::new();
                patch.insert("age".to_string(), json!(99));
                (user.id.unwrap().to_string(), patch)
            })
            .collect();
        repo.update_batch(updates).await.unwrap();

        for user in &saved {
            let found = repo.find_by_id(user.id.unwrap()).await.unwrap().unwrap();
            assert_eq!(found.age, Some(99));
        }
    }
}

#[tokio::test]
async fn test_delete_batch_parity_across_engine_paths() {
    let registry = registry();

    for conn in [connection(), connection_without_batch()] {
        let repo: Repository<User> = Repository::new(&registry, conn).unwrap();
        let saved = repo.save_batch(users(3)).await.unwrap();

        let ids = saved
            .iter()
            .map(|user| user.id.unwrap().to_string())
            .collect();
        repo.delete_batch(ids).await.unwrap();

        assert!(repo.find_all().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_find_all_returns_every_row() {
    let registry = registry();
    let repo: Repository<User> = Repository::new(&registry, connection()).unwrap();

    repo.save_batch(users(4)).await.unwrap();
    let all = repo.find_all().await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_shapes_do_not_interfere() {
    let registry = registry();
    let conn = connection();

    let user_repo: Repository<User> = Repository::new(&registry, Arc::clone(&conn)).unwrap();
    let post_repo: Repository<Post> = Repository::new(&registry, Arc::clone(&conn)).unwrap();

    assert_ne!(
        user_repo.metadata().table_name(),
        post_repo.metadata().table_name()
    );

    let user = user_repo.save(alice()).await.unwrap();
    let post = post_repo
        .save(Post {
            id: None,
            user_id: user.id,
            title: Some("Hello".to_string()),
            published_at: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
        })
        .await
        .unwrap();

    assert_eq!(user_repo.find_all().await.unwrap().len(), 1);
    let found = post_repo.find_by_id(post.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(found.user_id, user.id);
    assert_eq!(
        found.published_at,
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
    );
}

#[tokio::test]
async fn test_default_connection_binding_is_fixed_at_construction() {
    let registry = registry();

    let repo: Repository<User> = Repository::with_default_connection(&registry).unwrap();
    let bound = Arc::clone(repo.connection());

    // Replacing the default afterwards must not retarget the repository.
    set_default_connection(connection());
    assert!(Arc::ptr_eq(repo.connection(), &bound));
}

#[tokio::test]
async fn test_operations_reconnect_lazily_after_close() {
    let registry = registry();
    let conn = connection();
    let repo: Repository<User> = Repository::new(&registry, Arc::clone(&conn)).unwrap();

    repo.save(alice()).await.unwrap();
    conn.close().await;
    assert!(!conn.is_connected().await);

    // The next operation reconnects on its own. The in-memory backend
    // opens a fresh store per connect, so the old row is gone.
    assert!(repo.find_by_id(1).await.unwrap().is_none());
    assert!(conn.is_connected().await);
}

#[tokio::test]
async fn test_table_hooks_round_trip() {
    let registry = registry();
    let repo: Repository<User> = Repository::new(&registry, connection()).unwrap();

    repo.create_table().await.unwrap();
    repo.save(alice()).await.unwrap();
    repo.drop_table().await.unwrap();
    assert!(repo.find_all().await.unwrap().is_empty());
}
