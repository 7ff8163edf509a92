//! Socket setup: listener creation dan tuning stream yang di-accept.

use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener};

use mio::net::{TcpListener, TcpStream};

use crate::error::StartupError;

/// Bound, listening, non-blocking TCP socket.
///
/// std's `bind` sets SO_REUSEADDR on Unix and listens with the default
/// backlog.
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener, StartupError> {
    let listener = StdTcpListener::bind(addr).map_err(|source| StartupError::Bind { addr, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| StartupError::Bind { addr, source })?;

    Ok(TcpListener::from_std(listener))
}

/// Per-connection socket options: TCP_NODELAY, and SO_SNDBUF if configured.
pub fn tune_stream(stream: &TcpStream, send_buffer: Option<usize>) -> io::Result<()> {
    // Disable Nagle's algorithm untuk lower latency
    stream.set_nodelay(true)?;

    if let Some(size) = send_buffer {
        set_send_buffer(stream, size)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_send_buffer(stream: &TcpStream, size: usize) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let optval = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);
    // SAFETY: fd is owned by `stream` and outlives the call; optval is a
    // plain c_int whose size is passed alongside.
    let rc = unsafe {
        libc::setsockopt(
            stream.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };

    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_send_buffer(_stream: &TcpStream, _size: usize) -> io::Result<()> {
    Ok(())
}
