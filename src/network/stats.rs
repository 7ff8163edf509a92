//! Server statistics
//!
//! Dimiliki oleh `Server`, bukan global. Loop single-threaded, jadi counter
//! biasa cukup tanpa atomic.

use std::time::Duration;

use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub connections_accepted: u64,
    /// Answered with 503 at accept time
    pub connections_rejected: u64,
    pub connections_closed: u64,
    pub requests_parsed: u64,
    /// 413 and 501
    pub requests_rejected: u64,
    pub responses_completed: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

impl ServerStats {
    pub fn log_status(&self, active: usize, uptime: Duration) {
        info!(
            active,
            uptime_secs = uptime.as_secs(),
            accepted = self.connections_accepted,
            rejected = self.connections_rejected,
            closed = self.connections_closed,
            requests = self.requests_parsed,
            responses = self.responses_completed,
            bytes_in = self.bytes_received,
            bytes_out = self.bytes_sent,
            "status: {} active connections",
            active
        );
    }
}
