//! HTTP protocol implementation.
//!
//! This module implements the request/response plumbing of the server. One
//! request is served per connection; the connection is closed after the
//! response is written.
//!
//! # Architecture
//!
//! - **`connection`**: per-socket adapter feeding the parser and handing the
//!   finished request to the application
//! - **`parser`**: event-driven request parsing on top of `httparse`
//! - **`request`**: HTTP request representation and accessors
//! - **`response`**: HTTP response representation with builder pattern
//! - **`header`**: ordered, case-insensitive header list
//! - **`error`**: response-producing failures
//! - **`writer`**: serializes and writes HTTP responses to the client
//!
//! # Connection lifecycle
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← feed bytes to the parser
//!        └──────┬──────┘
//!               │ message complete
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Application::handle on its own task
//!        └──────┬───────────┘
//!               │ response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← serialize, write, close
//!        └──────────────────┘
//! ```
//!
//! A malformed request skips dispatching: a `400 Bad Request` is written and
//! the connection closed.

pub mod connection;
pub mod error;
pub mod header;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
