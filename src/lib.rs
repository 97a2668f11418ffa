//! Sketch - a minimal HTTP server framework
//!
//! Register handlers on an [`Application`], then serve it with [`run_app`]:
//!
//! ```no_run
//! use sketch::{Application, Config, HandlerResult, Request, Response, run_app};
//!
//! async fn hello(request: Request) -> HandlerResult {
//!     let username = request.param("username").unwrap_or_default();
//!     Ok(Response::ok(format!("Hello, {username}")))
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut app = Application::new();
//!     app.get("/{username}", hello)?;
//!     run_app(app, &Config::default())
//! }
//! ```

pub mod config;
pub mod http;
pub mod server;
pub mod web;

pub use config::Config;
pub use http::error::{Error, HttpException};
pub use http::request::{Method, Request};
pub use http::response::{Response, StatusCode, json_response};
pub use server::run_app;
pub use web::{Application, HandlerResult, Next};
