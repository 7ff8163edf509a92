//! Cooperative shutdown
//!
//! Loop mengecek token sekali per iterasi. Signal handler hanya menyalakan
//! flag atomik; `epoll_wait` yang terinterupsi kembali dengan EINTR dan loop
//! melihat flag di iterasi berikutnya.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Cancellation flag shared between the loop and whoever stops it
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Token the signal handler cancels; set once per process.
static SIGNAL_TOKEN: OnceLock<ShutdownToken> = OnceLock::new();

/// Cancel `token` on SIGINT or SIGTERM.
///
/// Only the first token installed in a process is wired to signals.
#[cfg(unix)]
pub fn install_signal_handlers(token: &ShutdownToken) -> io::Result<()> {
    if SIGNAL_TOKEN.set(token.clone()).is_err() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "signal handlers already installed",
        ));
    }

    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: handler only performs an atomic store.
        if unsafe { libc::signal(signal, handler) } == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn install_signal_handlers(token: &ShutdownToken) -> io::Result<()> {
    let _ = SIGNAL_TOKEN.set(token.clone());
    Ok(())
}

#[cfg(unix)]
extern "C" fn on_signal(_signal: libc::c_int) {
    if let Some(token) = SIGNAL_TOKEN.get() {
        token.cancel();
    }
}
