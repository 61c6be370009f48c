//! HTTP fan-out transport and the small HTTP/1.1 client behind it.
//!
//! Peers are plain `host:port` strings. Envelopes are POSTed as JSON to
//! [`PUBSUB_PATH`] on every peer; the same client performs the bootstrap GETs
//! against the root node.

use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::time::timeout;

use super::{Envelope, Transport};
use crate::error::TransportError;

pub const PUBSUB_PATH: &str = "/api/v1/pubsub/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Publishes to a fixed list of peers.
#[derive(Debug, Clone, Default)]
pub struct HttpPeers {
    peers: Vec<String>,
}

impl HttpPeers {
    pub fn new(peers: Vec<String>) -> Self {
        Self { peers }
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }
}

impl Transport for HttpPeers {
    fn publish(&self, envelope: Envelope) {
        if self.peers.is_empty() {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            warn!("PUBSUB - no runtime, dropping {} broadcast", envelope.message.channel());
            return;
        };
        let body = match serde_json::to_string(&envelope) {
            Ok(body) => body,
            Err(e) => {
                warn!("PUBSUB - could not encode envelope: {e}");
                return;
            }
        };

        let channel = envelope.message.channel();
        for peer in &self.peers {
            let peer = peer.clone();
            let body = body.clone();
            handle.spawn(async move {
                match request(&peer, "POST", PUBSUB_PATH, Some(&body)).await {
                    Ok(_) => debug!("PUBSUB - {channel} delivered to {peer}"),
                    Err(e) => warn!("PUBSUB - {channel} to {peer} failed: {e}"),
                }
            });
        }
    }
}

/// GET `path` from `addr` and decode the JSON body.
pub async fn get_json<T: DeserializeOwned>(addr: &str, path: &str) -> Result<T, TransportError> {
    let body = request(addr, "GET", path, None).await?;
    Ok(serde_json::from_str(&body)?)
}

async fn request(
    addr: &str,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<String, TransportError> {
    match timeout(REQUEST_TIMEOUT, send(addr, method, path, body)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(addr.to_string())),
    }
}

async fn send(
    addr: &str,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<String, TransportError> {
    let mut stream = TcpStream::connect(addr).await?;

    let body = body.unwrap_or("");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    parse_response(&raw)
}

/// Status check plus body extraction for a `Connection: close` response.
/// The body is handled as bytes and decoded as UTF-8 once, after any
/// chunked framing is removed.
fn parse_response(raw: &[u8]) -> Result<String, TransportError> {
    let split = find(raw, b"\r\n\r\n").ok_or(TransportError::MalformedResponse)?;
    let head = std::str::from_utf8(&raw[..split]).map_err(|_| TransportError::MalformedResponse)?;
    let body = &raw[split + 4..];

    let status: u16 = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .ok_or(TransportError::MalformedResponse)?;
    if !(200..300).contains(&status) {
        return Err(TransportError::Status(status));
    }

    let chunked = head.lines().any(|line| {
        let line = line.to_ascii_lowercase();
        line.starts_with("transfer-encoding:") && line.contains("chunked")
    });
    let body = if chunked {
        decode_chunked(body)?
    } else {
        body.to_vec()
    };
    String::from_utf8(body).map_err(|_| TransportError::MalformedResponse)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn decode_chunked(mut body: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut out = Vec::new();
    loop {
        let line_end = find(body, b"\r\n").ok_or(TransportError::MalformedResponse)?;
        let size_line =
            std::str::from_utf8(&body[..line_end]).map_err(|_| TransportError::MalformedResponse)?;
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size =
            usize::from_str_radix(size_hex, 16).map_err(|_| TransportError::MalformedResponse)?;
        if size == 0 {
            return Ok(out);
        }
        let rest = &body[line_end + 2..];
        let chunk = rest.get(..size).ok_or(TransportError::MalformedResponse)?;
        out.extend_from_slice(chunk);
        body = rest
            .get(size..)
            .and_then(|r| r.strip_prefix(b"\r\n"))
            .ok_or(TransportError::MalformedResponse)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_response() {
        let raw = b"HTTP/1.1 200 OK\r\ncontent-length: 7\r\n\r\n[1,2,3]";
        assert_eq!(parse_response(raw).unwrap(), "[1,2,3]");
    }

    #[test]
    fn parses_chunked_response() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n[1,2\r\n2\r\n,3\r\n1\r\n]\r\n0\r\n\r\n";
        assert_eq!(parse_response(raw).unwrap(), "[1,2,3]");
    }

    #[test]
    fn chunk_boundary_may_split_a_character() {
        // "é" is 0xC3 0xA9, split across two chunks
        let mut raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
        raw.extend_from_slice(b"3\r\n\"a\xC3\r\n3\r\n\xA9\"]\r\n0\r\n\r\n");
        assert_eq!(parse_response(&raw).unwrap(), "\"aé\"]");
    }

    #[test]
    fn rejects_invalid_utf8_body() {
        let raw = b"HTTP/1.1 200 OK\r\n\r\n\xFF\xFE";
        assert!(matches!(
            parse_response(raw),
            Err(TransportError::MalformedResponse)
        ));
    }

    #[test]
    fn rejects_error_status() {
        let raw = b"HTTP/1.1 400 Bad Request\r\n\r\nnope";
        assert!(matches!(
            parse_response(raw),
            Err(TransportError::Status(400))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_response(b"garbage"),
            Err(TransportError::MalformedResponse)
        ));
    }

    #[tokio::test]
    async fn unreachable_peer_is_an_error() {
        // port 9 (discard) is expected to be closed on test machines
        let err = get_json::<serde_json::Value>("127.0.0.1:9", "/").await;
        assert!(err.is_err());
    }

    #[test]
    fn publish_without_peers_or_runtime_is_a_noop() {
        use crate::pubsub::Message;
        let envelope = Envelope {
            origin: uuid::Uuid::new_v4(),
            message: Message::Blockchain(Vec::new()),
        };
        HttpPeers::default().publish(envelope.clone());
        HttpPeers::new(vec!["127.0.0.1:9".into()]).publish(envelope);
    }
}
