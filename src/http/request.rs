use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use url::Url;

use crate::http::error::HttpException;
use crate::http::header::Headers;
use crate::web::application::Application;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// CONNECT - Establish a tunnel to the target
    CONNECT,
    /// TRACE - Loop the request back to the client
    TRACE,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Matching is case-sensitive, as method tokens are on the wire.
    ///
    /// # Example
    ///
    /// ```
    /// # use sketch::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            "CONNECT" => Some(Method::CONNECT),
            "TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values captured from `{name}` placeholders of the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchInfo(BTreeMap<String, String>);

static EMPTY_MATCH_INFO: MatchInfo = MatchInfo(BTreeMap::new());

impl MatchInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for MatchInfo
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MatchInfo(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A complete HTTP request, as handed to handlers.
///
/// Everything except the match info is fixed at construction. Header keys
/// are lowercased on insertion.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    version: String,
    headers: Headers,
    body: Option<Bytes>,
    match_info: Option<MatchInfo>,
    app: Weak<Application>,
}

/// Builder for constructing Request objects.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<String>,
    version: Option<String>,
    headers: Headers,
    body: Option<Bytes>,
    app: Weak<Application>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// The request target, either origin-form (`/path?query`) or absolute.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(key.as_ref().to_ascii_lowercase(), value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn app(mut self, app: &Arc<Application>) -> Self {
        self.app = Arc::downgrade(app);
        self
    }

    pub fn build(self) -> Result<Request, HttpException> {
        let method = self
            .method
            .ok_or_else(|| HttpException::bad_request("method missing"))?;
        let target = self
            .url
            .ok_or_else(|| HttpException::bad_request("url missing"))?;
        let url = parse_target(&target, self.headers.get("host"))?;

        Ok(Request {
            method,
            url,
            version: self.version.unwrap_or_else(|| "1.1".to_string()),
            headers: self.headers,
            body: self.body,
            match_info: None,
            app: self.app,
        })
    }
}

/// Resolves a request target into a full URL.
///
/// Origin-form targets are joined onto `http://<host>`, falling back to
/// `localhost` when the request carries no usable `Host` header.
fn parse_target(target: &str, host: Option<&str>) -> Result<Url, HttpException> {
    let invalid = |e: url::ParseError| HttpException::bad_request(format!("invalid url {target}: {e}"));

    if !target.starts_with('/') {
        return Url::parse(target).map_err(invalid);
    }

    let mut url = host
        .and_then(|h| Url::parse(&format!("http://{h}/")).ok())
        .map_or_else(|| Url::parse("http://localhost/"), Ok)
        .map_err(invalid)?;

    // Not `Url::join`: a target such as `//other/x` must stay a path.
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    url.set_path(path);
    url.set_query(query);

    Ok(url)
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The percent-encoded path, without the query string.
    pub fn raw_path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    /// The first value of query parameter `name`, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Protocol version as reported by the parser, e.g. `"1.1"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The body decoded as UTF-8, `None` when the request has no body.
    pub fn text(&self) -> Result<Option<&str>, HttpException> {
        self.body
            .as_deref()
            .map(std::str::from_utf8)
            .transpose()
            .map_err(|e| HttpException::bad_request(format!("body is not valid utf-8: {e}")))
    }

    /// Deserializes the JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpException> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| HttpException::bad_request("request has no body"))?;

        serde_json::from_slice(body)
            .map_err(|e| HttpException::bad_request(format!("invalid json body: {e}")))
    }

    /// Parameters captured by the matched route; empty before routing.
    pub fn match_info(&self) -> &MatchInfo {
        self.match_info.as_ref().unwrap_or(&EMPTY_MATCH_INFO)
    }

    /// Shorthand for `match_info().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.match_info().get(name)
    }

    pub(crate) fn set_match_info(&mut self, match_info: MatchInfo) {
        debug_assert!(self.match_info.is_none(), "match info is set once per request");
        self.match_info = Some(match_info);
    }

    /// The application serving this request, if it is still alive.
    pub fn app(&self) -> Option<Arc<Application>> {
        self.app.upgrade()
    }
}
