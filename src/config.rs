//! Server configuration
//!
//! Semua nilai di-resolve sebelum event loop jalan; loop tidak membaca
//! environment atau flag sendiri.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::StartupError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DOCUMENT_ROOT: &str = "./www";
pub const DEFAULT_DOCUMENT: &str = "index.html";
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 8192;
pub const DEFAULT_MAX_EVENTS: usize = 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to (all interfaces by default)
    pub listen_addr: SocketAddr,
    /// Directory requested paths are resolved beneath
    pub document_root: PathBuf,
    /// File served for `/`
    pub default_document: String,
    /// Pool capacity; connections beyond this get a 503
    pub max_connections: usize,
    /// Per-connection request buffer, one byte of which is never filled
    pub input_buffer_size: usize,
    /// Upper bound on readiness events handled per wait
    pub max_events: usize,
    /// Wait timeout, only used as a liveness tick for shutdown checks
    pub poll_timeout: Duration,
    /// How often the loop logs its status line
    pub status_interval: Duration,
    /// SO_SNDBUF for accepted sockets, kernel default when `None`
    pub send_buffer_size: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            document_root: PathBuf::from(DEFAULT_DOCUMENT_ROOT),
            default_document: DEFAULT_DOCUMENT.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            input_buffer_size: DEFAULT_INPUT_BUFFER_SIZE,
            max_events: DEFAULT_MAX_EVENTS,
            poll_timeout: Duration::from_secs(1),
            status_interval: Duration::from_secs(10),
            send_buffer_size: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), StartupError> {
        if self.input_buffer_size < 2 {
            return Err(StartupError::InvalidConfig(format!(
                "input buffer size must be at least 2 bytes, got {}",
                self.input_buffer_size
            )));
        }
        if self.max_events == 0 {
            return Err(StartupError::InvalidConfig(
                "max events must be non-zero".to_string(),
            ));
        }
        if self.default_document.is_empty() {
            return Err(StartupError::InvalidConfig(
                "default document name is empty".to_string(),
            ));
        }
        Ok(())
    }
}
