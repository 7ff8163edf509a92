//! End-to-end scenarios against a live server on 127.0.0.1.
//!
//! Usage:
//!   cargo test --test server_test

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hermes_httpd::{Server, ServerConfig, ServerStats, ShutdownToken};
use tempfile::TempDir;

const INDEX: &[u8] = b"<html><body>Hello world</body></html>";

const KEEP_ALIVE_GET: &[u8] = b"GET /index.html HTTP/1.1\r\nConnection: keep-alive\r\n\r\n";

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownToken,
    handle: JoinHandle<ServerStats>,
    _root: TempDir,
}

impl TestServer {
    fn start(files: &[(&str, &[u8])], configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let root = TempDir::new().unwrap();
        for (name, contents) in files {
            fs::write(root.path().join(name), contents).unwrap();
        }

        let mut config = ServerConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            document_root: root.path().to_path_buf(),
            poll_timeout: Duration::from_millis(20),
            ..ServerConfig::default()
        };
        configure(&mut config);

        let shutdown = ShutdownToken::new();
        let server = Server::bind(config, shutdown.clone()).unwrap();
        let addr = server.local_addr();
        let handle = thread::spawn(move || server.run());

        Self {
            addr,
            shutdown,
            handle,
            _root: root,
        }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream
    }

    fn stop(self) -> ServerStats {
        self.shutdown.cancel();
        self.handle.join().unwrap()
    }
}

/// Raw response split into header block (with terminator) and body.
struct RawResponse {
    head: String,
    body: Vec<u8>,
}

impl RawResponse {
    fn status_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            (key == name).then(|| value.trim())
        })
    }

    fn bytes(&self) -> Vec<u8> {
        let mut all = self.head.clone().into_bytes();
        all.extend_from_slice(&self.body);
        all
    }
}

fn read_response(stream: &mut TcpStream) -> RawResponse {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).unwrap();
        head.push(byte[0]);
    }
    let head = String::from_utf8(head).unwrap();

    let len: usize = head
        .lines()
        .find_map(|l| l.strip_prefix("Content-Length: "))
        .expect("response without Content-Length")
        .parse()
        .unwrap();

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).unwrap();
    RawResponse { head, body }
}

fn assert_closed(stream: &mut TcpStream) {
    let mut buf = [0u8; 64];
    assert_eq!(stream.read(&mut buf).unwrap(), 0, "expected the server to close");
}

#[test]
fn keep_alive_round_trip_is_repeatable() {
    assert_eq!(INDEX.len(), 37);
    let server = TestServer::start(&[("index.html", INDEX)], |_| {});
    let mut stream = server.connect();

    stream.write_all(KEEP_ALIVE_GET).unwrap();
    let first = read_response(&mut stream);
    assert_eq!(first.status_line(), "HTTP/1.1 200 OK");
    assert_eq!(first.header("Content-Type"), Some("text/html"));
    assert_eq!(first.header("Content-Length"), Some("37"));
    assert_eq!(first.header("Connection"), Some("keep-alive"));
    assert_eq!(first.body, INDEX);

    // Same connection, same request: byte-identical answer.
    stream.write_all(KEEP_ALIVE_GET).unwrap();
    let second = read_response(&mut stream);
    assert_eq!(second.bytes(), first.bytes());

    drop(stream);
    let stats = server.stop();
    assert_eq!(stats.connections_accepted, 1);
    assert_eq!(stats.requests_parsed, 2);
    assert_eq!(stats.responses_completed, 2);
}

#[test]
fn without_marker_connection_closes_after_response() {
    let server = TestServer::start(&[("index.html", INDEX)], |_| {});
    let mut stream = server.connect();

    stream.write_all(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
    let resp = read_response(&mut stream);
    assert_eq!(resp.status_line(), "HTTP/1.1 200 OK");
    assert_eq!(resp.header("Connection"), Some("close"));
    assert_eq!(resp.body, INDEX);
    assert_closed(&mut stream);

    server.stop();
}

#[test]
fn root_without_default_document_is_404() {
    let server = TestServer::start(&[], |_| {});
    let mut stream = server.connect();

    stream.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();
    let resp = read_response(&mut stream);
    assert_eq!(resp.status_line(), "HTTP/1.1 404 Not Found");
    assert_eq!(resp.header("Content-Length"), Some("14"));
    assert_eq!(resp.header("Connection"), Some("close"));
    assert_eq!(resp.body, b"File not found");
    assert_closed(&mut stream);

    server.stop();
}

#[test]
fn root_serves_default_document() {
    let server = TestServer::start(&[("home.htm", b"home".as_slice())], |config| {
        config.default_document = "home.htm".to_string();
    });
    let mut stream = server.connect();

    stream.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
    let resp = read_response(&mut stream);
    assert_eq!(resp.status_line(), "HTTP/1.1 200 OK");
    assert_eq!(resp.header("Content-Type"), Some("text/html"));
    assert_eq!(resp.body, b"home");

    server.stop();
}

#[test]
fn post_is_501_even_with_keep_alive() {
    let server = TestServer::start(&[("index.html", INDEX)], |_| {});
    let mut stream = server.connect();

    stream
        .write_all(b"POST / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .unwrap();
    let resp = read_response(&mut stream);
    assert_eq!(resp.status_line(), "HTTP/1.1 501 Not Implemented");
    assert_eq!(resp.body, b"Only GET requests supported");
    assert_eq!(
        resp.header("Content-Length"),
        Some("Only GET requests supported".len().to_string().as_str())
    );
    assert_eq!(resp.header("Connection"), Some("close"));
    assert_closed(&mut stream);

    let stats = server.stop();
    assert_eq!(stats.requests_rejected, 1);
}

#[test]
fn unterminated_request_filling_buffer_is_413() {
    const BUFFER: usize = 64;
    let server = TestServer::start(&[], |config| config.input_buffer_size = BUFFER);
    let mut stream = server.connect();

    // capacity - 1 bytes, no CRLFCRLF anywhere
    stream.write_all(&[b'a'; BUFFER - 1]).unwrap();
    let resp = read_response(&mut stream);
    assert_eq!(resp.status_line(), "HTTP/1.1 413 Request Entity Too Large");
    assert_eq!(resp.body, b"Request is too large");
    assert_eq!(resp.header("Connection"), Some("close"));
    // Exactly one response, then the socket is closed.
    assert_closed(&mut stream);

    let stats = server.stop();
    assert_eq!(stats.requests_rejected, 1);
    assert_eq!(stats.responses_completed, 1);
}

#[test]
fn request_split_across_writes_is_reassembled() {
    let server = TestServer::start(&[("a.txt", b"split".as_slice())], |_| {});
    let mut stream = server.connect();

    stream.write_all(b"GET /a.txt HT").unwrap();
    thread::sleep(Duration::from_millis(50));
    stream.write_all(b"TP/1.1\r\n").unwrap();
    thread::sleep(Duration::from_millis(50));
    stream.write_all(b"\r\n").unwrap();

    let resp = read_response(&mut stream);
    assert_eq!(resp.header("Content-Type"), Some("text/plain"));
    assert_eq!(resp.body, b"split");

    server.stop();
}

#[test]
fn full_pool_answers_503_and_keeps_slots() {
    let server = TestServer::start(&[("index.html", INDEX)], |config| config.max_connections = 1);

    // Occupy the only slot and make sure it is live.
    let mut held = server.connect();
    held.write_all(KEEP_ALIVE_GET).unwrap();
    assert_eq!(read_response(&mut held).status_line(), "HTTP/1.1 200 OK");

    // The refused client sends nothing, so the close after 503 is clean.
    let mut refused = server.connect();
    let mut raw = Vec::new();
    refused.read_to_end(&mut raw).unwrap();
    assert_eq!(
        raw,
        b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 20\r\nConnection: close\r\n\r\nServer is overloaded"
    );

    // The pooled connection is unaffected.
    held.write_all(KEEP_ALIVE_GET).unwrap();
    assert_eq!(read_response(&mut held).body, INDEX);

    drop(held);
    let stats = server.stop();
    assert_eq!(stats.connections_accepted, 1);
    assert_eq!(stats.connections_rejected, 1);
}

#[test]
fn large_file_survives_partial_writes() {
    let big: Vec<u8> = (0..4 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    let server = TestServer::start(&[("big.bin", big.as_slice())], |config| {
        config.send_buffer_size = Some(4096);
    });
    let mut stream = server.connect();

    stream.write_all(b"GET /big.bin HTTP/1.1\r\n\r\n").unwrap();
    let resp = read_response(&mut stream);
    assert_eq!(resp.header("Content-Type"), Some("application/octet-stream"));
    assert_eq!(resp.body.len(), big.len());
    assert!(resp.body == big, "body differs from file");

    let stats = server.stop();
    assert_eq!(stats.responses_completed, 1);
    assert!(stats.bytes_sent >= big.len() as u64);
}

#[test]
fn shutdown_closes_idle_connections() {
    let server = TestServer::start(&[("index.html", INDEX)], |_| {});
    let mut idle = server.connect();

    // Make sure the connection is pooled before stopping.
    idle.write_all(KEEP_ALIVE_GET).unwrap();
    read_response(&mut idle);

    let stats = server.stop();
    assert_eq!(stats.connections_closed, 1);
    assert_closed(&mut idle);
}
