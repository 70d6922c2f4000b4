//! Runtime configuration loaded from environment variables.
//!
//! Every knob has a default so the server starts with zero configuration
//! for local development. `dotenv` is loaded by `main` before this runs.

use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string.
    /// Env: `DATABASE_URL`
    /// Default: `sqlite://quietdesk.db?mode=rwc`
    pub database_url: String,

    /// Socket address the HTTP/WebSocket server binds to.
    /// Env: `BIND_ADDR`
    /// Default: `0.0.0.0:8080`
    pub bind_addr: SocketAddr,

    /// Maximum pooled database connections.
    /// Env: `DB_MAX_CONNECTIONS`
    /// Default: `16`
    pub db_max_connections: u32,

    /// Per-connection delivery queue capacity. A consumer that falls this
    /// far behind starts losing its oldest undelivered events.
    /// Env: `DELIVERY_QUEUE_CAPACITY`
    /// Default: `1024`
    pub delivery_queue_capacity: usize,

    /// Seconds between retention sweeps of expired messages.
    /// Env: `RETENTION_SWEEP_SECS`
    /// Default: `3600`
    pub retention_sweep_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://quietdesk.db?mode=rwc".to_owned(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_max_connections: 16,
            delivery_queue_capacity: 1024,
            retention_sweep_secs: 3600,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: dotenv::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: env_parsed("BIND_ADDR", defaults.bind_addr),
            db_max_connections: env_parsed("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            delivery_queue_capacity: env_parsed("DELIVERY_QUEUE_CAPACITY", defaults.delivery_queue_capacity),
            retention_sweep_secs: env_parsed("RETENTION_SWEEP_SECS", defaults.retention_sweep_secs),
        }
    }
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    match dotenv::var(key) {
        Ok(raw) => raw.parse().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert!(cfg.delivery_queue_capacity > 0);
        assert!(cfg.retention_sweep_secs > 0);
    }
}
