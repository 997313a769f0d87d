use bytes::{Bytes, BytesMut};
use http::StatusCode;

/// An HTTP response under construction
///
/// Built fresh for every request; identical requests produce byte-identical
/// responses since nothing here depends on time or shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers in the order they will be written
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Creates a response with the given status, content type and body
    pub fn new(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    /// Creates a 200 response with a `text/html` body
    pub fn html(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, "text/html", body)
    }

    /// Creates a plain-text response with the given status
    pub fn text(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status, "text/plain", body)
    }

    /// Appends a header to the response
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Serializes the response to HTTP/1.1 wire format.
    ///
    /// `Content-Length` is always emitted so clients can frame the body.
    pub fn to_bytes(&self) -> Bytes {
        let reason = self.status.canonical_reason().unwrap_or("Unknown");
        let mut wire = BytesMut::with_capacity(128 + self.body.len());

        wire.extend_from_slice(
            format!("HTTP/1.1 {} {}\r\n", self.status.as_u16(), reason).as_bytes(),
        );
        for (name, value) in &self.headers {
            wire.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        wire.extend_from_slice(format!("Content-Length: {}\r\n\r\n", self.body.len()).as_bytes());
        wire.extend_from_slice(&self.body);

        wire.freeze()
    }
}
