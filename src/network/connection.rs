//! Connection handling dengan bounded buffers
//!
//! Satu `Connection` memiliki satu stream, input buffer berkapasitas tetap,
//! dan paling banyak satu response yang sedang dikirim.

use std::io::{self, Read, Write};
use std::net::SocketAddr;

use super::writer::{self, Flushed};
use crate::core::{InputBuffer, OutputBuffer};
use crate::error::ConnectionError;
use crate::protocol::Response;

/// Lifecycle of a pool slot
///
/// ```text
/// Reading ──(parsed | rejected)──▶ Writing ──(keep-alive)──▶ Reading
///    │                               │
///    └──────── I/O failure ──────────┴──(close)──▶ Free
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accumulating request bytes
    Reading,
    /// Response buffered, waiting for the socket to drain it
    Writing,
    /// Slot holds no connection
    Free,
}

/// What to do with a connection whose response went out completely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Already reset; wait for the next request
    KeepAlive,
    /// Release the slot
    Close,
}

/// One accepted peer
pub struct Connection<S> {
    stream: S,
    peer: Option<SocketAddr>,
    input: InputBuffer,
    output: Option<OutputBuffer>,
    keep_alive: bool,
    state: ConnectionState,
    requests_served: u64,
}

impl<S> Connection<S> {
    pub fn new(stream: S, peer: Option<SocketAddr>, input_capacity: usize) -> Self {
        Self {
            stream,
            peer,
            input: InputBuffer::with_capacity(input_capacity),
            output: None,
            keep_alive: false,
            state: ConnectionState::Reading,
            requests_served: 0,
        }
    }

    #[inline(always)]
    pub fn stream(&self) -> &S {
        &self.stream
    }

    #[inline(always)]
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    #[inline(always)]
    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    #[inline(always)]
    pub fn output(&self) -> Option<&OutputBuffer> {
        self.output.as_ref()
    }

    #[inline(always)]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    #[inline(always)]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served
    }

    /// Queue a full response and switch to `Writing`.
    pub fn begin_response(&mut self, response: Response) {
        self.keep_alive = response.keep_alive;
        self.output = Some(OutputBuffer::new(response.bytes));
        self.state = ConnectionState::Writing;
    }

    /// Called once the whole response has been written.
    ///
    /// Keep-alive connections drop their output, rewind the input cursor to
    /// zero and go back to `Reading`. Others keep everything as is for the
    /// pool to release.
    pub fn complete_response(&mut self) -> Disposition {
        debug_assert!(
            self.output.as_ref().map_or(true, OutputBuffer::is_complete),
            "response completed with unsent bytes"
        );
        self.requests_served += 1;

        if !self.keep_alive {
            return Disposition::Close;
        }

        self.output = None;
        self.input.clear();
        self.state = ConnectionState::Reading;
        Disposition::KeepAlive
    }
}

impl<S: Read> Connection<S> {
    /// Drain the socket into the input buffer until `WouldBlock`.
    ///
    /// Edge-triggered readiness is not redelivered for bytes left behind, so
    /// reading stops only on `WouldBlock` or a full buffer. Returns the
    /// number of bytes read; end-of-stream is `PeerClosed`.
    pub fn fill_input(&mut self) -> Result<usize, ConnectionError> {
        let mut total = 0;

        while !self.input.is_full() {
            match self.input.fill_from(&mut self.stream) {
                Ok(0) => return Err(ConnectionError::PeerClosed),
                Ok(n) => total += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ConnectionError::ReadFailed(e)),
            }
        }

        Ok(total)
    }
}

impl<S: Write> Connection<S> {
    /// Push pending output; see [`writer::drain_output`].
    pub fn flush_output(&mut self) -> Result<Flushed, ConnectionError> {
        match self.output.as_mut() {
            Some(output) => writer::drain_output(output, &mut self.stream),
            None => Ok(Flushed {
                written: 0,
                complete: true,
            }),
        }
    }
}
