//! Error kinds of the event loop.
//!
//! Only `StartupError` ever leaves the loop. Everything else is scoped to a
//! single connection: parse errors become an error response, resource errors
//! become a 503 on the refused socket, connection errors release the slot.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::protocol::StatusCode;

/// Request could not be turned into a file lookup.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Input buffer filled up before the header terminator arrived.
    #[error("request header exceeds the input buffer")]
    TooLarge,
    /// Anything other than `GET`.
    #[error("unsupported request method")]
    UnsupportedMethod,
}

impl ParseError {
    /// Status line used for the rejection response.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::TooLarge => StatusCode::PayloadTooLarge,
            ParseError::UnsupportedMethod => StatusCode::NotImplemented,
        }
    }
}

/// Admission control failures at accept time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    #[error("connection pool exhausted ({capacity} slots)")]
    PoolExhausted { capacity: usize },
}

/// A stream the pool refused, handed back so the caller can answer it.
#[derive(Debug)]
pub struct Rejected<S> {
    pub error: ResourceError,
    pub stream: S,
}

/// Terminal failure of one connection. The slot is released, the loop goes on.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("read failed: {0}")]
    ReadFailed(#[source] io::Error),
    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("multiplexer registration failed: {0}")]
    Registration(#[source] io::Error),
}

/// Fatal errors raised before the loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to create multiplexer: {0}")]
    Multiplexer(#[source] io::Error),
    #[error("failed to register listener: {0}")]
    Register(#[source] io::Error),
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] io::Error),
}
