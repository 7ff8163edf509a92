//! Write scheduler
//!
//! Mendorong sisa output ke socket sampai habis atau `WouldBlock`. Partial
//! write aman: cursor `sent` maju sebanyak byte yang diterima kernel, sisanya
//! menunggu event writable berikutnya.

use std::io::{self, Write};

use crate::core::OutputBuffer;
use crate::error::ConnectionError;

/// Result of one flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flushed {
    /// Bytes accepted by the sink during this attempt
    pub written: usize,
    /// `sent == total` after this attempt
    pub complete: bool,
}

/// Write `output` from its cursor until done or the sink would block.
#[inline]
pub fn drain_output<W: Write + ?Sized>(
    output: &mut OutputBuffer,
    sink: &mut W,
) -> Result<Flushed, ConnectionError> {
    let mut written = 0;

    while !output.is_complete() {
        match sink.write(output.remaining()) {
            Ok(0) => {
                return Err(ConnectionError::WriteFailed(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "socket accepted zero bytes",
                )));
            }
            Ok(n) => {
                output.advance(n);
                written += n;
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Ok(Flushed {
                    written,
                    complete: false,
                });
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ConnectionError::WriteFailed(e)),
        }
    }

    Ok(Flushed {
        written,
        complete: true,
    })
}

/// Single best-effort write, retried only on `Interrupted`.
///
/// Used where there is no connection to come back to, such as the 503 sent
/// on a socket the pool refused.
pub fn write_once<W: Write + ?Sized>(sink: &mut W, bytes: &[u8]) -> io::Result<usize> {
    loop {
        match sink.write(bytes) {
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts a fixed number of bytes per flush, then reports `WouldBlock`.
    struct ThrottledSink {
        budget: usize,
        received: Vec<Vec<u8>>,
    }

    impl ThrottledSink {
        fn new(budget: usize) -> Self {
            Self {
                budget,
                received: Vec::new(),
            }
        }
    }

    impl Write for ThrottledSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.received.push(buf[..n].to_vec());
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn partial_write_then_resume() {
        let original = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello".to_vec();
        let n = original.len();
        let k = 10;
        let mut output = OutputBuffer::new(original.clone());

        let mut sink = ThrottledSink::new(k);
        let first = drain_output(&mut output, &mut sink).unwrap();
        assert_eq!(first, Flushed { written: k, complete: false });
        assert_eq!(output.sent(), k);

        // Next writable event: kernel has room for the rest.
        sink.budget = usize::MAX;
        let second = drain_output(&mut output, &mut sink).unwrap();
        assert_eq!(second, Flushed { written: n - k, complete: true });
        assert_eq!(output.sent(), output.total());

        assert_eq!(sink.received.concat(), original);
    }

    #[test]
    fn would_block_leaves_cursor_untouched() {
        let mut output = OutputBuffer::new(b"abc".to_vec());
        let mut sink = ThrottledSink::new(0);

        let flushed = drain_output(&mut output, &mut sink).unwrap();
        assert_eq!(flushed, Flushed { written: 0, complete: false });
        assert_eq!(output.sent(), 0);
    }

    #[test]
    fn zero_length_write_is_an_error() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut output = OutputBuffer::new(b"abc".to_vec());
        let err = drain_output(&mut output, &mut Closed).unwrap_err();
        assert!(matches!(err, ConnectionError::WriteFailed(ref e) if e.kind() == io::ErrorKind::WriteZero));
    }

    #[test]
    fn hard_error_is_write_failed() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut output = OutputBuffer::new(b"abc".to_vec());
        let err = drain_output(&mut output, &mut Broken).unwrap_err();
        assert!(matches!(err, ConnectionError::WriteFailed(_)));
        assert_eq!(output.sent(), 0);
    }

    /// Fails with `Interrupted` a fixed number of times before accepting.
    struct FlakySink {
        interrupts: usize,
        received: Vec<u8>,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.received.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_once_retries_interrupted() {
        let mut sink = FlakySink {
            interrupts: 2,
            received: Vec::new(),
        };
        assert_eq!(write_once(&mut sink, b"busy").unwrap(), 4);
        assert_eq!(sink.interrupts, 0);
        assert_eq!(sink.received, b"busy");
    }

    #[test]
    fn write_once_does_not_retry_would_block() {
        let mut sink = ThrottledSink::new(0);
        let err = write_once(&mut sink, b"busy").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert!(sink.received.is_empty());
    }

    #[test]
    fn empty_output_completes_immediately() {
        let mut output = OutputBuffer::new(Vec::new());
        let mut sink = ThrottledSink::new(0);
        let flushed = drain_output(&mut output, &mut sink).unwrap();
        assert!(flushed.complete);
    }
}
