//! The application layer: routing, middleware and dispatch.
//!
//! An [`Application`] owns a [`Router`] mapping `(method, path pattern)` to
//! [`Handler`]s, an ordered middleware chain, and startup/shutdown hooks.
//! [`Application::handle`] is the single boundary where every failure is
//! turned into a [`Response`](crate::http::response::Response).

use std::future::Future;
use std::pin::Pin;

use crate::http::error::Error;
use crate::http::response::Response;

pub mod application;
pub mod handler;
pub mod middleware;
pub mod router;

pub use application::{Application, ApplicationBuilder, Hook};
pub use handler::Handler;
pub use middleware::{Middleware, Next};
pub use router::{MatchPolicy, Route, RouteError, Router};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What handlers and middleware produce.
pub type HandlerResult = Result<Response, Error>;
