use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::http::request::Request;
use crate::web::handler::Handler;
use crate::web::{BoxFuture, HandlerResult};

/// Wraps the downstream handler of every request.
///
/// A middleware decides whether and when to call [`Next::run`]; whatever it
/// returns is the response of the request.
///
/// ```
/// # use sketch::http::request::Request;
/// # use sketch::web::{HandlerResult, Next};
/// async fn timing(request: Request, next: Next) -> HandlerResult {
///     let started = std::time::Instant::now();
///     let mut response = next.run(request).await?;
///     response.add_header("X-Elapsed-Micros", started.elapsed().as_micros().to_string());
///     Ok(response)
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, request: Request, next: Next) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: Request, next: Next) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(request, next))
    }
}

/// The rest of the chain, as seen from a middleware.
#[derive(Clone)]
pub struct Next {
    handler: Arc<dyn Handler>,
}

impl Next {
    pub async fn run(self, request: Request) -> HandlerResult {
        self.handler.call(request).await
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

struct Wrapped {
    middleware: Arc<dyn Middleware>,
    inner: Arc<dyn Handler>,
}

impl Handler for Wrapped {
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        let next = Next {
            handler: Arc::clone(&self.inner),
        };
        self.middleware.call(request, next)
    }
}

/// Threads `handler` through `middlewares`.
///
/// The first middleware is the outermost: `[a, b]` yields `a(b(handler))`.
pub(crate) fn compose(middlewares: &[Arc<dyn Middleware>], handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
    middlewares.iter().rev().fold(handler, |inner, middleware| {
        Arc::new(Wrapped {
            middleware: Arc::clone(middleware),
            inner,
        })
    })
}
