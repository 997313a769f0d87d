use crate::{EchoError, Result};
use bytes::Bytes;
use http::Method;

/// Maximum number of headers accepted in a request head
const MAX_HEADERS: usize = 64;

/// A parsed HTTP request
///
/// Headers are kept as an ordered list of name/value pairs: receipt order is
/// preserved and duplicate names stay as separate entries, which a `HeaderMap`
/// would not guarantee.
///
/// The request owns everything it needs for one request/response cycle and
/// nothing outlives that cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request target path
    pub path: String,
    /// Minor HTTP version (0 for HTTP/1.0, 1 for HTTP/1.1)
    pub version: u8,
    /// Headers in receipt order, duplicates possible
    pub headers: Vec<(String, String)>,
    /// Raw request body
    pub body: Bytes,
}

impl Request {
    /// Returns the first header value matching `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the connection should stay open after this request
    pub fn keep_alive(&self) -> bool {
        match self.header("connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => false,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version >= 1,
        }
    }
}

/// Outcome of attempting to parse a request out of buffered bytes
#[derive(Debug)]
pub enum ParseOutcome {
    /// A full request was parsed; the second field is the number of bytes
    /// consumed from the buffer (head plus body)
    Complete(Request, usize),
    /// More bytes are needed
    Partial,
}

/// Parses one HTTP request from the front of `buf`.
///
/// The body is framed by `Content-Length`; a missing `Content-Length` means an
/// empty body. Chunked transfer encoding is rejected as invalid since bodies
/// are never streamed.
pub fn parse(buf: &[u8]) -> Result<ParseOutcome> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);

    let head_len = match req.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(ParseOutcome::Partial),
        Err(e) => return Err(EchoError::Parse(format!("failed to parse request head: {e}"))),
    };

    let method = req
        .method
        .ok_or_else(|| EchoError::Parse("missing method".to_string()))
        .and_then(|m| {
            Method::from_bytes(m.as_bytes())
                .map_err(|e| EchoError::Parse(format!("invalid method {m:?}: {e}")))
        })?;
    let path = req
        .path
        .ok_or_else(|| EchoError::Parse("missing request target".to_string()))?
        .to_string();
    let version = req.version.unwrap_or(1);

    let header_list: Vec<(String, String)> = req
        .headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();

    if header_list
        .iter()
        .any(|(n, v)| n.eq_ignore_ascii_case("transfer-encoding") && v.to_ascii_lowercase().contains("chunked"))
    {
        return Err(EchoError::InvalidRequest(
            "chunked transfer encoding is not supported".to_string(),
        ));
    }

    let content_length = match header_list
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
    {
        Some((_, v)) => v
            .trim()
            .parse::<usize>()
            .map_err(|_| EchoError::InvalidRequest(format!("invalid Content-Length: {v:?}")))?,
        None => 0,
    };

    if buf.len() < head_len + content_length {
        return Ok(ParseOutcome::Partial);
    }

    let body = Bytes::copy_from_slice(&buf[head_len..head_len + content_length]);

    Ok(ParseOutcome::Complete(
        Request {
            method,
            path,
            version,
            headers: header_list,
            body,
        },
        head_len + content_length,
    ))
}
