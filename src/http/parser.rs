//! Event-driven request parsing.
//!
//! The byte-level work is done by `httparse`; [`RequestParser`] buffers the
//! incoming chunks, waits for the head and the `Content-Length` body to be
//! complete, and reports what it saw through [`ParserEvents`].

use bytes::{Buf, BytesMut};
use httparse::Status;

/// Upper bound on header fields in one request head.
pub const MAX_HEADERS: usize = 64;

/// Upper bound on the request line plus headers, in bytes.
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Upper bound on an announced `Content-Length`.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequest,
    #[error("malformed header")]
    InvalidHeader,
    #[error("invalid content-length")]
    InvalidContentLength,
    #[error("chunked transfer encoding is not supported")]
    Unsupported,
    #[error("request too large")]
    TooLarge,
}

impl From<httparse::Error> for ParseError {
    fn from(err: httparse::Error) -> Self {
        match err {
            httparse::Error::HeaderName | httparse::Error::HeaderValue => ParseError::InvalidHeader,
            httparse::Error::TooManyHeaders => ParseError::TooLarge,
            _ => ParseError::InvalidRequest,
        }
    }
}

/// Request-line facts reported once the whole message has arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHead {
    pub method: String,
    /// `"1.0"` or `"1.1"`
    pub version: String,
}

/// Callbacks fired by [`RequestParser::feed`], in wire order.
pub trait ParserEvents {
    fn on_url(&mut self, url: &[u8]);
    /// Called once per header field.
    fn on_header(&mut self, name: &[u8], value: &[u8]);
    /// Not called for messages without a body.
    fn on_body(&mut self, body: &[u8]);
    fn on_message_complete(&mut self, head: MessageHead);
}

#[derive(Debug)]
enum State {
    Head,
    Body { content_length: usize, head: MessageHead },
    Done,
}

#[derive(Debug)]
pub struct RequestParser {
    buffer: BytesMut,
    state: State,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            state: State::Head,
        }
    }

    /// Whether a full message has been reported.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Feeds one chunk of bytes read from the peer.
    ///
    /// Only the first message is parsed; anything fed after it completes is
    /// discarded.
    pub fn feed<E: ParserEvents>(&mut self, data: &[u8], events: &mut E) -> Result<(), ParseError> {
        if self.is_complete() {
            return Ok(());
        }
        self.buffer.extend_from_slice(data);

        loop {
            match &mut self.state {
                State::Head => match parse_head(&self.buffer, events)? {
                    Some((head_len, content_length, head)) => {
                        self.buffer.advance(head_len);
                        self.state = State::Body { content_length, head };
                    }
                    None => return Ok(()),
                },

                State::Body { content_length, head } => {
                    if self.buffer.len() < *content_length {
                        return Ok(());
                    }

                    let body = self.buffer.split_to(*content_length);
                    if !body.is_empty() {
                        events.on_body(&body);
                    }

                    let head = std::mem::replace(
                        head,
                        MessageHead { method: String::new(), version: String::new() },
                    );
                    self.state = State::Done;
                    self.buffer.clear();
                    events.on_message_complete(head);
                    return Ok(());
                }

                State::Done => return Ok(()),
            }
        }
    }
}

/// Parses the request head, if complete, reporting url and headers.
///
/// Returns the head length in bytes, the announced body length and the
/// request-line facts.
fn parse_head<E: ParserEvents>(
    buf: &[u8],
    events: &mut E,
) -> Result<Option<(usize, usize, MessageHead)>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);

    let head_len = match req.parse(buf)? {
        Status::Complete(len) if len > MAX_HEAD_BYTES => return Err(ParseError::TooLarge),
        Status::Complete(len) => len,
        Status::Partial if buf.len() > MAX_HEAD_BYTES => return Err(ParseError::TooLarge),
        Status::Partial => return Ok(None),
    };

    let method = req.method.ok_or(ParseError::InvalidRequest)?;
    let path = req.path.ok_or(ParseError::InvalidRequest)?;
    let version = req.version.ok_or(ParseError::InvalidRequest)?;

    events.on_url(path.as_bytes());

    let mut content_length = 0;
    for header in req.headers.iter() {
        if header.name.eq_ignore_ascii_case("content-length") {
            content_length = std::str::from_utf8(header.value)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or(ParseError::InvalidContentLength)?;
            if content_length > MAX_BODY_BYTES {
                return Err(ParseError::TooLarge);
            }
        } else if header.name.eq_ignore_ascii_case("transfer-encoding")
            && header.value.to_ascii_lowercase().windows(7).any(|w| w == b"chunked")
        {
            return Err(ParseError::Unsupported);
        }

        events.on_header(header.name.as_bytes(), header.value);
    }

    let head = MessageHead {
        method: method.to_string(),
        version: format!("1.{version}"),
    };
    Ok(Some((head_len, content_length, head)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        url: Vec<u8>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        head: Option<MessageHead>,
    }

    impl ParserEvents for Recorder {
        fn on_url(&mut self, url: &[u8]) {
            self.url = url.to_vec();
        }

        fn on_header(&mut self, name: &[u8], value: &[u8]) {
            self.headers.push((
                String::from_utf8_lossy(name).into_owned(),
                String::from_utf8_lossy(value).into_owned(),
            ));
        }

        fn on_body(&mut self, body: &[u8]) {
            self.body.extend_from_slice(body);
        }

        fn on_message_complete(&mut self, head: MessageHead) {
            self.head = Some(head);
        }
    }

    #[test]
    fn parse_simple_get() {
        let mut parser = RequestParser::new();
        let mut rec = Recorder::default();

        parser
            .feed(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n", &mut rec)
            .unwrap();

        assert!(parser.is_complete());
        assert_eq!(rec.url, b"/");
        assert_eq!(rec.headers, vec![("Host".to_string(), "example.com".to_string())]);
        assert_eq!(rec.head.unwrap().method, "GET");
    }

    #[test]
    fn body_split_across_chunks() {
        let mut parser = RequestParser::new();
        let mut rec = Recorder::default();

        parser
            .feed(b"POST /api HTTP/1.0\r\nContent-Length: 5\r\n\r\nhe", &mut rec)
            .unwrap();
        assert!(rec.head.is_none());

        parser.feed(b"llo", &mut rec).unwrap();
        assert_eq!(rec.body, b"hello");
        assert_eq!(rec.head.unwrap().version, "1.0");
    }
}
