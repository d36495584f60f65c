//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::{Error, Result};

/// Default JSON body limit (100 KiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub hostname: String,
    /// Tokio worker threads
    pub workers: usize,
    /// Largest request body accepted, in bytes
    pub max_body_size: usize,
    /// How long shutdown waits for open connections to drain
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            hostname: "0.0.0.0".to_string(),
            workers: default_workers(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Resolve `hostname:port` into a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let host = if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("[{}]", self.hostname)
        } else {
            self.hostname.clone()
        };
        format!("{}:{}", host, self.port)
            .parse()
            .map_err(|e| Error::Internal(format!("invalid address {}:{}: {}", self.hostname, self.port, e)))
    }
}

#[cfg(feature = "native")]
fn default_workers() -> usize {
    num_cpus::get()
}

#[cfg(not(feature = "native"))]
fn default_workers() -> usize {
    1
}
