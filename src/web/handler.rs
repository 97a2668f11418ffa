use std::future::Future;

use crate::http::request::Request;
use crate::web::{BoxFuture, HandlerResult};

/// An endpoint registered on the router.
///
/// Implemented for every `Fn(Request) -> impl Future<Output = HandlerResult>`,
/// so plain `async fn`s can be registered directly:
///
/// ```
/// # use sketch::http::{request::Request, response::Response};
/// # use sketch::web::HandlerResult;
/// async fn hello(request: Request) -> HandlerResult {
///     let name = request.param("username").unwrap_or("world");
///     Ok(Response::ok(format!("Hello, {name}")))
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(request))
    }
}
