//! Network Layer: edge-triggered, single-threaded I/O
//!
//! Menggunakan mio untuk readiness multiplexing (epoll/kqueue/IOCP).
//!
//! Fitur:
//! - Non-blocking I/O, drain sampai `WouldBlock`
//! - Bounded connection pool dengan admission control (503)
//! - Partial write scheduling
//! - Cooperative shutdown lewat `ShutdownToken`

mod connection;
mod multiplexer;
mod server;
mod shutdown;
mod socket;
mod stats;
mod writer;

pub use connection::{Connection, ConnectionState, Disposition};
pub use multiplexer::{MioMultiplexer, Multiplexer, Readiness};
pub use server::{Server, LISTENER};
pub use shutdown::{install_signal_handlers, ShutdownToken};
pub use socket::{bind_listener, tune_stream};
pub use stats::ServerStats;
pub use writer::{drain_output, write_once, Flushed};

pub use mio::{Interest, Token};
