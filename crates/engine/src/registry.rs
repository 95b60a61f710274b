//! Connection registry
//!
//! Maps logical connection names to live connections. A process-wide
//! registry is available through [`ConnectionRegistry::global`]; tests and
//! embedders that need isolation create their own instance and hand it to
//! the coordinator explicitly.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;
use txscope_core::{Connection, ConnectionResolver, DEFAULT_CONNECTION_NAME};

static GLOBAL: Lazy<Arc<ConnectionRegistry>> = Lazy::new(|| Arc::new(ConnectionRegistry::new()));

/// Named connections
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<String, Arc<dyn Connection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// The process-wide registry
    pub fn global() -> Arc<ConnectionRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Register `connection` under `name`
    ///
    /// Returns the connection previously registered under that name.
    pub fn register<C>(&self, name: impl Into<String>, connection: Arc<C>) -> Option<Arc<dyn Connection>>
    where
        C: Connection + 'static,
    {
        let name = name.into();
        debug!(connection = %name, "connection registered");
        self.connections.insert(name, connection)
    }

    /// Register `connection` under [`DEFAULT_CONNECTION_NAME`]
    pub fn register_default<C>(&self, connection: Arc<C>) -> Option<Arc<dyn Connection>>
    where
        C: Connection + 'static,
    {
        self.register(DEFAULT_CONNECTION_NAME, connection)
    }

    /// Remove the connection registered under `name`
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Connection>> {
        self.connections.remove(name).map(|(_, connection)| connection)
    }

    /// Check whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl ConnectionResolver for ConnectionRegistry {
    fn get_connection(&self, name: &str) -> Option<Arc<dyn Connection>> {
        self.connections
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("names", &self.names())
            .finish()
    }
}
