//! Request parser
//!
//! Bukan parser HTTP lengkap: hanya request line `GET <path>` dan pencarian
//! literal marker keep-alive. Semua header lain diabaikan.
//!
//! Keep-alive bersifat opt-in. Tanpa `Connection: keep-alive`, koneksi
//! ditutup setelah response, berbeda dari default HTTP/1.1.

use std::ffi::OsString;

use crate::error::ParseError;

/// End of the header block
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Literal substring that turns on connection reuse
pub const KEEP_ALIVE_MARKER: &[u8] = b"Connection: keep-alive";

/// The only accepted method token
pub const METHOD_GET: &[u8] = b"GET";

/// A recognised `GET` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Raw request path bytes, `/` already rewritten to the default document
    pub path: OsString,
    pub keep_alive: bool,
}

/// Result of looking at the accumulated bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// No terminator yet and still room to read
    Incomplete,
    Parsed(Request),
    Rejected(ParseError),
}

/// Inspect `buf` for a complete request header.
///
/// `limit` is the most bytes the input buffer will ever hold; reaching it
/// without a terminator means the request is too large.
pub fn parse_request(buf: &[u8], limit: usize, default_document: &str) -> ParseOutcome {
    let Some(end) = find_header_end(buf) else {
        if buf.len() >= limit {
            return ParseOutcome::Rejected(ParseError::TooLarge);
        }
        return ParseOutcome::Incomplete;
    };

    let header = &buf[..end];
    let mut tokens = header
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty());

    if tokens.next() != Some(METHOD_GET) {
        return ParseOutcome::Rejected(ParseError::UnsupportedMethod);
    }

    let path = match tokens.next() {
        None | Some(b"/") => OsString::from(format!("/{default_document}")),
        Some(raw) => path_from_bytes(raw),
    };

    ParseOutcome::Parsed(Request {
        path,
        keep_alive: contains(header, KEEP_ALIVE_MARKER),
    })
}

/// Path bytes go to the filesystem untouched.
#[cfg(unix)]
fn path_from_bytes(raw: &[u8]) -> OsString {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    OsStr::from_bytes(raw).to_os_string()
}

#[cfg(not(unix))]
fn path_from_bytes(raw: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(raw).into_owned())
}

#[inline]
fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

#[inline]
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
