//! Runtime settings for the API server.

use std::net::SocketAddr;

use crate::db::DEFAULT_MAX_CONNECTIONS;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Settings needed to start serving the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// Run pending migrations before accepting requests.
    pub migrate_on_start: bool,
}

impl ServerConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_addr: default_bind_addr(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            migrate_on_start: true,
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_migrate_on_start(mut self, migrate_on_start: bool) -> Self {
        self.migrate_on_start = migrate_on_start;
        self
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new("postgres://localhost/hoard");
        assert_eq!(config.database_url, "postgres://localhost/hoard");
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.max_connections, 10);
        assert!(config.migrate_on_start);
    }

    #[test]
    fn test_overrides() {
        let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
        let config = ServerConfig::new("postgres://localhost/hoard")
            .with_bind_addr(addr)
            .with_max_connections(0)
            .with_migrate_on_start(false);
        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 1);
        assert!(!config.migrate_on_start);
    }
}
