//! Protocol Layer: restricted HTTP/1.x
//!
//! Prinsip desain:
//! - Satu request line `GET <path>`, header lain diabaikan
//! - Response dibangun utuh ke satu buffer sebelum dikirim
//! - Body error konstan, Content-Length selalu exact

mod mime;
mod request;
mod response;

pub use mime::{content_type, DEFAULT_CONTENT_TYPE};
pub use request::{parse_request, ParseOutcome, Request, HEADER_TERMINATOR, KEEP_ALIVE_MARKER};
pub use response::{Response, StatusCode};
