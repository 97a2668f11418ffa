//! Response-producing failures.
//!
//! An [`HttpException`] is both an error that a handler can return with `?`
//! and a complete response: the dispatcher writes it out verbatim, also when
//! it reached the handler wrapped in an `anyhow::Error`. Anything
//! else a handler fails with is an [`Error::Internal`] and ends up as a
//! `500` diagnostic page built by [`internal_error_response`].

use crate::http::response::{Response, ResponseBuilder, StatusCode, DEFAULT_CONTENT_TYPE};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpException {
    /// 404
    #[error("{}", .reason.as_deref().unwrap_or("Not Found"))]
    NotFound {
        reason: Option<String>,
        content_type: Option<String>,
    },
    /// 400
    #[error("{}", .reason.as_deref().unwrap_or("Bad Request"))]
    BadRequest {
        reason: Option<String>,
        content_type: Option<String>,
    },
    /// 302, redirects to `location`.
    #[error("{}", .reason.as_deref().unwrap_or("Found"))]
    Found {
        location: String,
        reason: Option<String>,
        content_type: Option<String>,
    },
}

impl HttpException {
    pub fn not_found(reason: impl Into<String>) -> Self {
        HttpException::NotFound {
            reason: Some(reason.into()),
            content_type: None,
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        HttpException::BadRequest {
            reason: Some(reason.into()),
            content_type: None,
        }
    }

    pub fn found(location: impl Into<String>) -> Self {
        HttpException::Found {
            location: location.into(),
            reason: None,
            content_type: None,
        }
    }

    /// Overrides the `text/plain` default used when rendering the reason.
    pub fn with_content_type(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            HttpException::NotFound { content_type, .. }
            | HttpException::BadRequest { content_type, .. }
            | HttpException::Found { content_type, .. } => *content_type = Some(value.into()),
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpException::NotFound { .. } => StatusCode::NOT_FOUND,
            HttpException::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpException::Found { .. } => StatusCode::FOUND,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            HttpException::NotFound { reason, .. }
            | HttpException::BadRequest { reason, .. }
            | HttpException::Found { reason, .. } => reason.as_deref(),
        }
    }

    fn content_type(&self) -> &str {
        match self {
            HttpException::NotFound { content_type, .. }
            | HttpException::BadRequest { content_type, .. }
            | HttpException::Found { content_type, .. } => {
                content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
            }
        }
    }

    /// Renders the exception as the response that is sent for it.
    pub fn to_response(&self) -> Response {
        let mut builder =
            ResponseBuilder::new(self.status_code()).content_type(self.content_type());

        if let Some(reason) = self.reason() {
            builder = builder.body(reason.to_string());
        }
        if let HttpException::Found { location, .. } = self {
            builder = builder.header("Location", location.as_str());
        }

        builder.build()
    }
}

impl From<HttpException> for Response {
    fn from(exc: HttpException) -> Self {
        exc.to_response()
    }
}

/// The failure type of handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] HttpException),
    #[error(transparent)]
    Internal(anyhow::Error),
}

/// An [`HttpException`] that was carried through `anyhow` is still an
/// [`Error::Http`].
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<HttpException>() {
            Ok(exc) => Error::Http(exc),
            Err(err) => Error::Internal(err),
        }
    }
}

impl Error {
    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Error::Internal(anyhow::anyhow!("{msg}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(err.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(err.into())
    }
}

/// Builds the generic `500` page for an unexpected failure.
///
/// `trace` is embedded line by line; it is usually the `{:?}` rendering of
/// the error, which carries the cause chain and, when enabled, a backtrace.
pub fn internal_error_response(description: &str, trace: &str) -> Response {
    let trace = trace.replace('\n', "</br>");
    let page = format!(
        "\n<div>\n    <h1>500 Internal server error</h1>\n    \
         <span>Server got itself in trouble : <b>{description}</b><span>\n    \
         <p>{trace}</p>\n</div>\n"
    );

    ResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
        .content_type("text/html")
        .body(page)
        .build()
}
