//! Response builder
//!
//! Setiap response adalah satu buffer kontigu: header lalu body. Body error
//! adalah string konstan; Content-Length selalu dihitung dari body-nya.

use std::io;

use tracing::{debug, warn};

use super::mime;
use super::request::Request;
use crate::core::{DocumentRoot, StaticFile};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Status lines the server can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 413 Request Entity Too Large
    PayloadTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 503 Service Unavailable
    ServiceUnavailable,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::PayloadTooLarge => "Request Entity Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Constant body sent with an error status. Empty for 200.
    pub fn error_body(&self) -> &'static str {
        match self {
            StatusCode::Ok => "",
            StatusCode::NotFound => "File not found",
            StatusCode::PayloadTooLarge => "Request is too large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Only GET requests supported",
            StatusCode::ServiceUnavailable => "Server is overloaded",
        }
    }
}

/// Serialized response plus the keep-alive decision that goes with it
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub keep_alive: bool,
    pub bytes: Vec<u8>,
}

impl Response {
    /// Error response; always closes the connection.
    pub fn error(status: StatusCode) -> Self {
        let body = status.error_body();
        let mut bytes = head(status, None, body.len(), false).into_bytes();
        bytes.extend_from_slice(body.as_bytes());

        Self {
            status,
            keep_alive: false,
            bytes,
        }
    }

    /// Resolve `request.path` under `root` and build the full response.
    ///
    /// Missing or unopenable file gives 404, a failed read or allocation 500.
    pub fn for_request(request: &Request, root: &DocumentRoot) -> Self {
        let file = match root.open(&request.path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = ?request.path, error = %e, "resource not found");
                return Self::error(StatusCode::NotFound);
            }
        };

        match file_response(request, &file) {
            Ok(response) => response,
            Err(e) => {
                warn!(path = ?request.path, error = %e, "failed to load resource");
                Self::error(StatusCode::InternalServerError)
            }
        }
    }
}

fn file_response(request: &Request, file: &StaticFile) -> io::Result<Response> {
    let contents = file.contents()?;
    let header = head(
        StatusCode::Ok,
        Some(mime::content_type(&request.path)),
        contents.len(),
        request.keep_alive,
    );

    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(header.len() + contents.len())
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(&contents);

    Ok(Response {
        status: StatusCode::Ok,
        keep_alive: request.keep_alive,
        bytes,
    })
}

fn head(status: StatusCode, content_type: Option<&str>, len: usize, keep_alive: bool) -> String {
    let connection = if keep_alive { "keep-alive" } else { "close" };
    match content_type {
        Some(ct) => format!(
            "{HTTP_VERSION} {} {}\r\nContent-Type: {ct}\r\nContent-Length: {len}\r\nConnection: {connection}\r\n\r\n",
            status.as_u16(),
            status.reason_phrase(),
        ),
        None => format!(
            "{HTTP_VERSION} {} {}\r\nContent-Length: {len}\r\nConnection: {connection}\r\n\r\n",
            status.as_u16(),
            status.reason_phrase(),
        ),
    }
}
