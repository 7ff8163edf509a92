//! Hermes HTTPD - single-threaded static file server
//!
//! Arsitektur:
//! - Edge-triggered: satu event loop mio, semua socket non-blocking
//! - Bounded: connection pool berkapasitas tetap, 503 saat penuh
//! - No partial drop: response dikirim sampai habis lintas partial write
//! - Zero-Copy read: file di-mmap langsung ke buffer response
//!
//! Hanya `GET` yang dilayani. Keep-alive harus diminta eksplisit dengan
//! `Connection: keep-alive`; tanpa itu koneksi ditutup setelah response.

pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod protocol;

pub use config::ServerConfig;
pub use error::{ConnectionError, ParseError, ResourceError, StartupError};
pub use network::{Server, ServerStats, ShutdownToken};
