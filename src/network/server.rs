//! Hermes HTTP server dengan event-driven I/O
//!
//! Satu thread memiliki listener, multiplexer, dan connection pool. Satu-
//! satunya titik suspend adalah `Multiplexer::wait`; semua operasi socket
//! non-blocking.
//!
//! Alur per koneksi:
//! - accept → pool → register READABLE
//! - readable → drain input → parse → build response → interest WRITABLE
//! - writable → drain output → keep-alive: reset + READABLE, else release

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;

use mio::net::{TcpListener, TcpStream};
use mio::{Interest, Token};
use tracing::{debug, error, info, trace, warn};

use super::connection::{ConnectionState, Disposition};
use super::multiplexer::{MioMultiplexer, Multiplexer, Readiness};
use super::shutdown::ShutdownToken;
use super::socket;
use super::stats::ServerStats;
use super::writer;
use crate::config::ServerConfig;
use crate::core::{ConnectionPool, DocumentRoot};
use crate::error::{ConnectionError, Rejected, StartupError};
use crate::protocol::{parse_request, ParseOutcome, Response, StatusCode};

/// Token of the listening socket; pool slot `i` uses `Token(i + 1)`.
pub const LISTENER: Token = Token(0);

#[inline(always)]
fn slot_token(slot: usize) -> Token {
    Token(slot + 1)
}

#[inline(always)]
fn token_slot(token: Token) -> usize {
    token.0 - 1
}

/// Hermes HTTP server
///
/// Owns everything the loop touches. Nothing is global: counters live in
/// `stats`, cancellation comes in through `shutdown`.
pub struct Server<M: Multiplexer = MioMultiplexer> {
    mux: M,
    listener: TcpListener,
    local_addr: SocketAddr,
    pool: ConnectionPool<TcpStream>,
    root: DocumentRoot,
    config: ServerConfig,
    stats: ServerStats,
    shutdown: ShutdownToken,
}

impl Server<MioMultiplexer> {
    /// Bind the listener and create the mio multiplexer.
    pub fn bind(config: ServerConfig, shutdown: ShutdownToken) -> Result<Self, StartupError> {
        config.validate()?;
        let listener = socket::bind_listener(config.listen_addr)?;
        let mux = MioMultiplexer::new(config.max_events).map_err(StartupError::Multiplexer)?;
        Self::with_multiplexer(config, listener, mux, shutdown)
    }
}

impl<M: Multiplexer> Server<M> {
    /// Build a server over an already bound listener and any backend.
    pub fn with_multiplexer(
        config: ServerConfig,
        mut listener: TcpListener,
        mut mux: M,
        shutdown: ShutdownToken,
    ) -> Result<Self, StartupError> {
        config.validate()?;

        let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
            addr: config.listen_addr,
            source,
        })?;
        mux.register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(StartupError::Register)?;

        Ok(Self {
            mux,
            listener,
            local_addr,
            pool: ConnectionPool::new(config.max_connections, config.input_buffer_size),
            root: DocumentRoot::new(&config.document_root),
            config,
            stats: ServerStats::default(),
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    pub fn pool(&self) -> &ConnectionPool<TcpStream> {
        &self.pool
    }

    /// Run until the shutdown token is cancelled, then release every live
    /// connection and the listener. Returns the final counters.
    pub fn run(mut self) -> ServerStats {
        info!(
            addr = %self.local_addr,
            root = %self.root.path().display(),
            max_connections = self.pool.capacity(),
            "listening"
        );

        let started = Instant::now();
        let mut last_status = started;
        let mut ready = Vec::with_capacity(self.config.max_events);

        while !self.shutdown.is_cancelled() {
            if let Err(e) = self.turn(&mut ready) {
                error!(error = %e, "multiplexer wait failed");
                break;
            }

            if last_status.elapsed() >= self.config.status_interval {
                self.stats.log_status(self.pool.occupied(), started.elapsed());
                last_status = Instant::now();
            }
        }

        info!(active = self.pool.occupied(), "shutting down");
        self.teardown();
        info!(
            accepted = self.stats.connections_accepted,
            responses = self.stats.responses_completed,
            "server stopped"
        );

        self.stats
    }

    /// One wait plus dispatch of the whole batch.
    ///
    /// EINTR counts as an empty batch; any other wait error is returned.
    pub(crate) fn turn(&mut self, ready: &mut Vec<Readiness>) -> io::Result<()> {
        match self.mux.wait(ready, Some(self.config.poll_timeout)) {
            Ok(()) => {}
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e),
        }

        for readiness in ready.drain(..) {
            self.dispatch(readiness);
        }
        Ok(())
    }

    fn dispatch(&mut self, readiness: Readiness) {
        if readiness.token == LISTENER {
            // No new admissions once shutdown is requested.
            if !self.shutdown.is_cancelled() {
                self.accept_connections();
            }
            return;
        }

        let slot = token_slot(readiness.token);

        if readiness.readable {
            self.handle_readable(slot);
        }
        if readiness.writable {
            self.handle_writable(slot);
        }
        if (readiness.error || readiness.hang_up) && self.pool.get(slot).is_some() {
            self.release(slot, "socket error or hang-up");
        }
    }

    /// Accept until `WouldBlock`; the listener is edge-triggered too.
    fn accept_connections(&mut self) {
        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    break;
                }
            };

            if let Err(e) = socket::tune_stream(&stream, self.config.send_buffer_size) {
                debug!(%peer, error = %e, "failed to tune socket");
            }

            match self.pool.allocate(stream, Some(peer)) {
                Ok(slot) => self.admit(slot, peer),
                Err(rejected) => self.reject_overloaded(rejected, peer),
            }
        }
    }

    fn admit(&mut self, slot: usize, peer: SocketAddr) {
        self.stats.connections_accepted += 1;

        let Some(conn) = self.pool.get_mut(slot) else {
            return;
        };
        if let Err(e) = self
            .mux
            .register(conn.stream_mut(), slot_token(slot), Interest::READABLE)
        {
            let err = ConnectionError::Registration(e);
            warn!(slot, %peer, error = %err, "failed to register connection");
            self.release(slot, err);
            return;
        }

        debug!(slot, %peer, active = self.pool.occupied(), "connection accepted");
    }

    /// Pool is full: one best-effort 503 straight on the raw socket, then
    /// close. No slot is used.
    fn reject_overloaded(&mut self, rejected: Rejected<TcpStream>, peer: SocketAddr) {
        let Rejected { error, mut stream } = rejected;
        let response = Response::error(StatusCode::ServiceUnavailable);

        match writer::write_once(&mut stream, &response.bytes) {
            Ok(n) => self.stats.bytes_sent += n as u64,
            Err(e) => debug!(%peer, error = %e, "failed to send 503"),
        }
        self.stats.connections_rejected += 1;
        warn!(%peer, %error, "rejecting connection");
    }

    fn handle_readable(&mut self, slot: usize) {
        let Some(conn) = self.pool.get_mut(slot) else {
            return;
        };
        // Input is ignored while a response is in flight.
        if conn.state() != ConnectionState::Reading {
            return;
        }

        let received = match conn.fill_input() {
            Ok(n) => n,
            Err(e) => {
                self.release(slot, e);
                return;
            }
        };
        self.stats.bytes_received += received as u64;
        trace!(slot, received, buffered = conn.input().used(), "read");

        let outcome = parse_request(
            conn.input().as_bytes(),
            conn.input().limit(),
            &self.config.default_document,
        );
        let response = match outcome {
            ParseOutcome::Incomplete => return,
            ParseOutcome::Parsed(request) => {
                self.stats.requests_parsed += 1;
                debug!(slot, path = ?request.path, keep_alive = request.keep_alive, "request");
                Response::for_request(&request, &self.root)
            }
            ParseOutcome::Rejected(err) => {
                self.stats.requests_rejected += 1;
                debug!(slot, error = %err, "request rejected");
                Response::error(err.status())
            }
        };

        conn.begin_response(response);
        if let Err(e) = self
            .mux
            .modify_interest(conn.stream_mut(), slot_token(slot), Interest::WRITABLE)
        {
            self.release(slot, ConnectionError::Registration(e));
        }
    }

    fn handle_writable(&mut self, slot: usize) {
        let Some(conn) = self.pool.get_mut(slot) else {
            return;
        };
        if conn.state() != ConnectionState::Writing {
            return;
        }

        let flushed = match conn.flush_output() {
            Ok(flushed) => flushed,
            Err(e) => {
                self.release(slot, e);
                return;
            }
        };
        self.stats.bytes_sent += flushed.written as u64;
        trace!(slot, written = flushed.written, complete = flushed.complete, "write");

        if !flushed.complete {
            return;
        }
        self.stats.responses_completed += 1;

        match conn.complete_response() {
            Disposition::KeepAlive => {
                if let Err(e) =
                    self.mux
                        .modify_interest(conn.stream_mut(), slot_token(slot), Interest::READABLE)
                {
                    self.release(slot, ConnectionError::Registration(e));
                }
            }
            Disposition::Close => self.release(slot, "response complete"),
        }
    }

    /// Unregister, free the slot and close the socket.
    fn release(&mut self, slot: usize, reason: impl fmt::Display) {
        let Some(mut conn) = self.pool.release(slot) else {
            return;
        };

        if let Err(e) = self.mux.unregister(conn.stream_mut()) {
            trace!(slot, error = %e, "unregister failed");
        }
        self.stats.connections_closed += 1;
        debug!(
            slot,
            peer = ?conn.peer(),
            served = conn.requests_served(),
            %reason,
            "connection closed"
        );
    }

    fn teardown(&mut self) {
        for slot in self.pool.occupied_slots() {
            self.release(slot, "server shutdown");
        }
        if let Err(e) = self.mux.unregister(&mut self.listener) {
            debug!(error = %e, "failed to unregister listener");
        }
    }
}
