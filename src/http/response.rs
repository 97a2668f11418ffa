use bytes::Bytes;
use serde::Serialize;

use crate::http::header::{Headers, strip_line_breaks};

/// An HTTP status code.
///
/// Any `u16` can be carried; [`StatusCode::reason_phrase`] knows the standard
/// phrases and [`StatusCode::is_valid`] tells whether the code is one a
/// response may legally carry on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub const fn from_u16(code: u16) -> Self {
        StatusCode(code)
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use sketch::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    /// ```
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    pub const fn is_valid(&self) -> bool {
        self.0 >= 100 && self.0 <= 599
    }

    /// Returns the standard reason phrase, or `None` for unregistered codes.
    ///
    /// # Example
    ///
    /// ```
    /// # use sketch::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.reason_phrase(), Some("OK"));
    /// assert_eq!(StatusCode::from_u16(299).reason_phrase(), None);
    /// ```
    pub fn reason_phrase(&self) -> Option<&'static str> {
        let phrase = match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            102 => "Processing",
            103 => "Early Hints",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            203 => "Non-Authoritative Information",
            204 => "No Content",
            205 => "Reset Content",
            206 => "Partial Content",
            207 => "Multi-Status",
            208 => "Already Reported",
            226 => "IM Used",
            300 => "Multiple Choices",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            305 => "Use Proxy",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            407 => "Proxy Authentication Required",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            412 => "Precondition Failed",
            413 => "Request Entity Too Large",
            414 => "Request-URI Too Long",
            415 => "Unsupported Media Type",
            416 => "Requested Range Not Satisfiable",
            417 => "Expectation Failed",
            418 => "I'm a Teapot",
            421 => "Misdirected Request",
            422 => "Unprocessable Entity",
            423 => "Locked",
            424 => "Failed Dependency",
            425 => "Too Early",
            426 => "Upgrade Required",
            428 => "Precondition Required",
            429 => "Too Many Requests",
            431 => "Request Header Fields Too Large",
            451 => "Unavailable For Legal Reasons",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            506 => "Variant Also Negotiates",
            507 => "Insufficient Storage",
            508 => "Loop Detected",
            510 => "Not Extended",
            511 => "Network Authentication Required",
            _ => return None,
        };
        Some(phrase)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";
pub const DEFAULT_VERSION: &str = "1.1";

/// An HTTP response as produced by a handler.
///
/// Stays mutable through [`Response::add_body`] and [`Response::add_header`]
/// until it is handed to a writer and serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    body: Option<Bytes>,
    headers: Headers,
    content_type: String,
    version: String,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use sketch::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::CREATED)
///     .content_type("application/json")
///     .header("Cache-Control", "no-cache")
///     .body("{}")
///     .build();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        let mut response = Response::default();
        response.status = status.into();
        Self { response }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.add_header(key, value);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.response.add_body(body);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response.content_type = strip_line_breaks(content_type.into());
        self
    }

    /// Sets the protocol version written in the status line, e.g. `"1.0"`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.response.version = strip_line_breaks(version.into());
        self
    }

    pub fn build(self) -> Response {
        self.response
    }
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
            headers: Headers::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl Response {
    /// An empty `200 OK` response with `text/plain` content type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::OK).body(body).build()
    }

    /// A 200 OK response carrying an HTML document.
    pub fn html(body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::OK)
            .content_type("text/html")
            .body(body)
            .build()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn add_body(&mut self, data: impl Into<Bytes>) {
        self.body = Some(data.into());
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key, value);
    }

    /// Whether this response can be put on the wire as-is.
    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    /// Serializes the response into wire bytes.
    ///
    /// The content headers always come first, followed by the user headers
    /// in insertion order. Every response announces `Connection: close`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body_len = self.body.as_ref().map_or(0, Bytes::len);
        let mut buf = Vec::with_capacity(128 + body_len);

        let status_line = format!(
            "HTTP/{} {} {}\r\n",
            self.version,
            self.status.as_u16(),
            self.status.reason_phrase().unwrap_or("Unknown")
        );
        buf.extend_from_slice(status_line.as_bytes());

        write_header(&mut buf, "Content-Type", &self.content_type);
        write_header(&mut buf, "Content-Length", &body_len.to_string());
        write_header(&mut buf, "Connection", "close");

        for (k, v) in self.headers.iter() {
            write_header(&mut buf, k, v);
        }

        // Header/body separator
        buf.extend_from_slice(b"\r\n");

        if let Some(body) = &self.body {
            buf.extend_from_slice(body);
        }

        buf
    }
}

fn write_header(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

/// Builds a `200 OK` response whose body is `data` encoded as JSON.
pub fn json_response<T: Serialize + ?Sized>(data: &T) -> Result<Response, serde_json::Error> {
    let body = serde_json::to_vec(data)?;
    Ok(ResponseBuilder::new(StatusCode::OK)
        .content_type("application/json")
        .body(body)
        .build())
}
