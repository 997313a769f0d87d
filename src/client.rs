use crate::{EchoError, Result};
use bytes::BytesMut;
use http::{Method, StatusCode};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read timeout for operations
    pub read_timeout: std::time::Duration,
    /// Write timeout for operations
    pub write_timeout: std::time::Duration,
    /// Connection timeout
    pub connect_timeout: std::time::Duration,
    /// Buffer size for reading data
    pub buffer_size: usize,
    /// Maximum response size to prevent memory exhaustion
    pub max_response_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: std::time::Duration::from_secs(30),
            write_timeout: std::time::Duration::from_secs(30),
            connect_timeout: std::time::Duration::from_secs(10),
            buffer_size: 8192,
            max_response_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Builder for client configuration
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    pub fn max_response_size(mut self, size: usize) -> Self {
        self.config.max_response_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// A parsed HTTP response as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers in receipt order
    pub headers: Vec<(String, String)>,
    /// Raw response body
    pub body: Vec<u8>,
}

impl ClientResponse {
    /// Returns the first header value matching `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the body decoded as UTF-8
    pub fn body_text(&self) -> Result<String> {
        String::from_utf8(self.body.clone()).map_err(EchoError::Utf8)
    }
}

/// Minimal HTTP/1.1 client used to exercise the echo server
///
/// One request/response exchange per call; the connection stays open so
/// keep-alive behavior can be exercised across calls.
pub struct Client {
    stream: TcpStream,
    config: ClientConfig,
}

impl Client {
    /// Connect to a server with custom configuration
    pub async fn connect_with_config(addr: SocketAddr, config: ClientConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| EchoError::Timeout("Connection timeout".to_string()))??;
        Ok(Self { stream, config })
    }

    /// Connect with default configuration
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Sends a request and reads the full response.
    ///
    /// Headers are sent exactly as given, in order; `Content-Length` is
    /// appended only when the body is non-empty so that header-reflection
    /// checks see precisely the headers they sent.
    pub async fn send(
        &mut self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<ClientResponse> {
        let mut wire = BytesMut::with_capacity(128 + body.len());
        wire.extend_from_slice(format!("{method} {path} HTTP/1.1\r\n").as_bytes());
        for (name, value) in headers {
            wire.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        if !body.is_empty() {
            wire.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
        }
        wire.extend_from_slice(b"\r\n");
        wire.extend_from_slice(body);

        self.send_raw(&wire).await
    }

    /// Sends pre-serialized bytes and reads the full response.
    ///
    /// Lets tests exercise the server's handling of malformed requests.
    pub async fn send_raw(&mut self, wire: &[u8]) -> Result<ClientResponse> {
        timeout(self.config.write_timeout, async {
            self.stream.write_all(wire).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| EchoError::Timeout("Write timeout".to_string()))??;

        self.read_response().await
    }

    /// Reads bytes until a complete response can be parsed
    async fn read_response(&mut self) -> Result<ClientResponse> {
        let mut buffer = BytesMut::with_capacity(self.config.buffer_size);
        let mut read_buf = vec![0u8; self.config.buffer_size];

        loop {
            if let Some(response) = parse_response(&buffer)? {
                return Ok(response);
            }

            if buffer.len() > self.config.max_response_size {
                return Err(EchoError::Config(format!(
                    "Response too large: {} bytes, max allowed: {}",
                    buffer.len(),
                    self.config.max_response_size
                )));
            }

            let n = timeout(self.config.read_timeout, self.stream.read(&mut read_buf))
                .await
                .map_err(|_| EchoError::Timeout("Read timeout".to_string()))??;

            if n == 0 {
                return Err(EchoError::IncompleteRequest);
            }
            buffer.extend_from_slice(&read_buf[..n]);
        }
    }
}

/// Parses a complete response from buffered bytes, or returns `None` when
/// more bytes are needed. Bodies are framed by `Content-Length`.
fn parse_response(buf: &[u8]) -> Result<Option<ClientResponse>> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut res = httparse::Response::new(&mut headers);

    let head_len = match res.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(EchoError::Parse(format!("failed to parse response head: {e}"))),
    };

    let status = res
        .code
        .ok_or_else(|| EchoError::Parse("missing status code".to_string()))
        .and_then(|c| {
            StatusCode::from_u16(c).map_err(|e| EchoError::Parse(format!("invalid status {c}: {e}")))
        })?;

    let header_list: Vec<(String, String)> = res
        .headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();

    let content_length = match header_list
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
    {
        Some((_, v)) => v
            .trim()
            .parse::<usize>()
            .map_err(|_| EchoError::Parse(format!("invalid Content-Length: {v:?}")))?,
        None => 0,
    };

    if buf.len() < head_len + content_length {
        return Ok(None);
    }

    Ok(Some(ClientResponse {
        status,
        headers: header_list,
        body: buf[head_len..head_len + content_length].to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn config_builder_sets_fields() {
        let config = ClientConfigBuilder::new()
            .read_timeout(Duration::from_secs(60))
            .write_timeout(Duration::from_secs(30))
            .buffer_size(2048)
            .max_response_size(1024 * 1024)
            .build();

        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.write_timeout, Duration::from_secs(30));
        assert_eq!(config.buffer_size, 2048);
        assert_eq!(config.max_response_size, 1024 * 1024);
    }

    #[test]
    fn parses_complete_response() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5\r\n\r\nhello";
        let response = parse_response(raw).unwrap().unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.body, b"hello");
    }

    #[test]
    fn partial_response_returns_none() {
        assert!(parse_response(b"HTTP/1.1 200 OK\r\nContent-Le").unwrap().is_none());
        assert!(
            parse_response(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhe")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn body_text_rejects_invalid_utf8() {
        let response = ClientResponse {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: vec![0xff, 0xfe],
        };
        assert!(matches!(response.body_text(), Err(EchoError::Utf8(_))));
    }
}
