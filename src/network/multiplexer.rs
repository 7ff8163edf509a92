//! Readiness multiplexer
//!
//! Loop server hanya bicara lewat trait `Multiplexer`; backend default adalah
//! `mio::Poll` (epoll/kqueue/IOCP). Semua registrasi edge-triggered: setelah
//! event datang, consumer wajib membaca/menulis sampai `WouldBlock`.

use std::io;
use std::time::Duration;

use mio::event::{Event, Source};
use mio::{Events, Interest, Poll, Token};

/// One ready descriptor from a wait batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub token: Token,
    pub readable: bool,
    pub writable: bool,
    /// Socket error pending
    pub error: bool,
    /// Both directions closed
    pub hang_up: bool,
}

impl From<&Event> for Readiness {
    fn from(event: &Event) -> Self {
        Self {
            token: event.token(),
            readable: event.is_readable(),
            writable: event.is_writable(),
            error: event.is_error(),
            hang_up: event.is_read_closed() && event.is_write_closed(),
        }
    }
}

/// Capability set the event loop needs from a readiness backend
pub trait Multiplexer {
    /// Start watching `source`; `token` comes back with every event for it.
    fn register(&mut self, source: &mut dyn Source, token: Token, interest: Interest) -> io::Result<()>;

    /// Replace the watched readiness conditions of a registered source.
    fn modify_interest(
        &mut self,
        source: &mut dyn Source,
        token: Token,
        interest: Interest,
    ) -> io::Result<()>;

    fn unregister(&mut self, source: &mut dyn Source) -> io::Result<()>;

    /// Block until something is ready or `timeout` passes.
    ///
    /// `ready` is cleared and refilled with this batch. An empty batch after
    /// a timeout is normal.
    fn wait(&mut self, ready: &mut Vec<Readiness>, timeout: Option<Duration>) -> io::Result<()>;
}

/// `mio::Poll` backed multiplexer
pub struct MioMultiplexer {
    poll: Poll,
    events: Events,
}

impl MioMultiplexer {
    /// `max_events` bounds how many events a single wait can return.
    pub fn new(max_events: usize) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(max_events),
        })
    }
}

impl Multiplexer for MioMultiplexer {
    fn register(&mut self, source: &mut dyn Source, token: Token, interest: Interest) -> io::Result<()> {
        self.poll.registry().register(source, token, interest)
    }

    fn modify_interest(
        &mut self,
        source: &mut dyn Source,
        token: Token,
        interest: Interest,
    ) -> io::Result<()> {
        self.poll.registry().reregister(source, token, interest)
    }

    fn unregister(&mut self, source: &mut dyn Source) -> io::Result<()> {
        self.poll.registry().deregister(source)
    }

    fn wait(&mut self, ready: &mut Vec<Readiness>, timeout: Option<Duration>) -> io::Result<()> {
        ready.clear();
        self.poll.poll(&mut self.events, timeout)?;
        ready.extend(self.events.iter().map(Readiness::from));
        Ok(())
    }
}
