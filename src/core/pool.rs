//! Fixed-capacity connection table
//!
//! Slot index dipakai langsung sebagai identitas koneksi (token multiplexer =
//! slot + 1). Free-list membuat allocate/release O(1) tanpa scan.

use std::net::SocketAddr;

use crate::error::{Rejected, ResourceError};
use crate::network::{Connection, ConnectionState};

/// Bounded pool of connection slots
///
/// A slot is either free or owns exactly one `Connection`, and through it
/// exactly one stream. Running out of slots is an ordinary outcome of
/// `allocate`, not a fault.
pub struct ConnectionPool<S> {
    slots: Vec<Option<Connection<S>>>,
    free: Vec<usize>,
    input_capacity: usize,
}

impl<S> ConnectionPool<S> {
    /// `input_capacity` is the request buffer size of every connection.
    pub fn new(capacity: usize, input_capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| None).collect();
        // Reversed so the lowest slot is handed out first.
        let free = (0..capacity).rev().collect();

        Self {
            slots,
            free,
            input_capacity,
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub fn occupied(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Bind `stream` to a free slot.
    ///
    /// On exhaustion the stream is handed back untouched inside `Rejected`.
    /// The caller must not have registered it with the multiplexer yet.
    pub fn allocate(&mut self, stream: S, peer: Option<SocketAddr>) -> Result<usize, Rejected<S>> {
        let Some(slot) = self.free.pop() else {
            return Err(Rejected {
                error: ResourceError::PoolExhausted {
                    capacity: self.capacity(),
                },
                stream,
            });
        };

        debug_assert!(self.slots[slot].is_none(), "free-list pointed at an occupied slot");
        self.slots[slot] = Some(Connection::new(stream, peer, self.input_capacity));
        Ok(slot)
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&Connection<S>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Connection<S>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    pub fn state(&self, slot: usize) -> ConnectionState {
        self.get(slot)
            .map_or(ConnectionState::Free, Connection::state)
    }

    /// Return the slot to the free list.
    ///
    /// The connection is handed back so the caller can log it; dropping it
    /// closes the stream and discards any output. Releasing a free slot is a
    /// caller bug and yields `None`.
    pub fn release(&mut self, slot: usize) -> Option<Connection<S>> {
        let conn = self.slots.get_mut(slot).and_then(Option::take);
        debug_assert!(conn.is_some(), "release of free slot {slot}");

        if conn.is_some() {
            self.free.push(slot);
        }
        conn
    }

    /// Slots currently holding a connection.
    pub fn occupied_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, conn)| conn.as_ref().map(|_| slot))
            .collect()
    }
}
