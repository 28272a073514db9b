//! Connection lifecycle.
//!
//! A [`Connection`] owns the configuration and at most one engine handle.
//! Repositories connect lazily through it; a process-wide default instance
//! exists for the common single-engine case.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tokio::sync::RwLock;

use rowbridge_core::engine::{Engine, EngineError};

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};

/// Builds engine handles from connection configuration.
///
/// The in-tree backends ship connectors; any external engine plugs in by
/// implementing this trait.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(
        &self,
        config: &ConnectionConfig,
    ) -> std::result::Result<Arc<dyn Engine>, EngineError>;
}

/// Connector used by [`Connection::new`] and the process-wide default:
/// opens the feature-selected in-tree backend.
#[derive(Debug, Clone, Default)]
pub struct DefaultConnector;

#[async_trait]
impl Connector for DefaultConnector {
    async fn open(
        &self,
        config: &ConnectionConfig,
    ) -> std::result::Result<Arc<dyn Engine>, EngineError> {
        let _ = config;
        #[cfg(feature = "inmemory")]
        {
            Ok(Arc::new(crate::engine::inmemory::InMemoryEngine::new()))
        }
        #[cfg(not(feature = "inmemory"))]
        {
            Err(EngineError::Unavailable(
                "no engine backend enabled; supply a Connector".to_string(),
            ))
        }
    }
}

/// A single logical connection to the persistence engine.
///
/// State machine: Disconnected, then `connect()`, then Connected, then
/// `close()`, back to Disconnected. Both transitions are idempotent.
/// Exactly one engine handle exists per connection; nothing here pools.
/// A single handle is not guaranteed safe for concurrent operations
/// beyond what the engine itself promises; callers needing parallelism
/// use independent connections or serialize access externally.
pub struct Connection {
    config: ConnectionConfig,
    connector: Box<dyn Connector>,
    engine: RwLock<Option<Arc<dyn Engine>>>,
}

impl Connection {
    /// Create a disconnected connection using the default connector.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, Box::new(DefaultConnector))
    }

    /// Create a disconnected connection with an explicit connector.
    pub fn with_connector(config: ConnectionConfig, connector: Box<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            engine: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        self.engine.read().await.is_some()
    }

    /// Establish the engine handle. No-op when already connected.
    ///
    /// The handle is probed with a ping before the connection transitions
    /// to Connected; on any failure the state is left untouched.
    pub async fn connect(&self) -> Result<()> {
        let mut guard = self.engine.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let engine = self
            .connector
            .open(&self.config)
            .await
            .map_err(|err| Error::Connection {
                reason: format!("failed to open engine handle: {err}"),
            })?;
        engine.ping().await.map_err(|err| Error::Connection {
            reason: format!("liveness probe failed: {err}"),
        })?;

        *guard = Some(engine);
        Ok(())
    }

    /// Probe the engine. `false` when disconnected or when the probe
    /// fails; never an error.
    pub async fn ping(&self) -> bool {
        let guard = self.engine.read().await;
        match guard.as_ref() {
            Some(engine) => engine.ping().await.is_ok(),
            None => false,
        }
    }

    /// Release the engine handle. Best-effort: a failing engine close is
    /// logged, never raised, and the connection always ends Disconnected.
    pub async fn close(&self) {
        let mut guard = self.engine.write().await;
        if let Some(engine) = guard.take() {
            if let Err(err) = engine.close().await {
                tracing::warn!(error = %err, "engine close failed; handle dropped anyway");
            }
        }
    }

    /// The engine handle, or [`Error::NotConnected`] when disconnected.
    pub async fn engine(&self) -> Result<Arc<dyn Engine>> {
        self.engine
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| Error::NotConnected {
                reason: "connection is closed".to_string(),
            })
    }
}

static DEFAULT_CONNECTION: Lazy<std::sync::RwLock<Arc<Connection>>> = Lazy::new(|| {
    std::sync::RwLock::new(Arc::new(Connection::new(ConnectionConfig::default())))
});

/// The process-wide default connection, lazily constructed with default
/// configuration on first access.
pub fn default_connection() -> Arc<Connection> {
    DEFAULT_CONNECTION
        .read()
        .expect("default connection lock poisoned")
        .clone()
}

/// Replace the process-wide default connection.
///
/// Only affects repositories constructed afterwards; existing repositories
/// keep the connection they were built with.
pub fn set_default_connection(connection: Arc<Connection>) {
    *DEFAULT_CONNECTION
        .write()
        .expect("default connection lock poisoned") = connection;
}
