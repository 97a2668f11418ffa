use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::try_join_all;
use tracing::{debug, error, info};

use crate::http::error::{Error, internal_error_response};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::web::handler::Handler;
use crate::web::middleware::{self, Middleware};
use crate::web::router::{MatchPolicy, RouteError, Router};
use crate::web::{BoxFuture, HandlerResult};

/// A startup or shutdown hook.
pub trait Hook: Send + Sync + 'static {
    fn call(&self, app: Arc<Application>) -> BoxFuture<'static, anyhow::Result<()>>;
}

impl<F, Fut> Hook for F
where
    F: Fn(Arc<Application>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn call(&self, app: Arc<Application>) -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(self(app))
    }
}

/// Routes, middleware and lifecycle hooks of one server.
///
/// Configure it mutably, then share it behind an `Arc`: requests keep a weak
/// back-reference to the application that serves them.
pub struct Application {
    router: Router,
    middlewares: Vec<Arc<dyn Middleware>>,
    on_startup: Vec<Arc<dyn Hook>>,
    on_shutdown: Vec<Arc<dyn Hook>>,
}

#[derive(Default)]
pub struct ApplicationBuilder {
    policy: MatchPolicy,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl ApplicationBuilder {
    /// Appends a middleware; earlier middlewares wrap later ones.
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Application {
        Application {
            router: Router::with_policy(self.policy),
            middlewares: self.middlewares,
            on_startup: Vec::new(),
            on_shutdown: Vec::new(),
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// An application without middleware, using first-entry routing.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn add_route<H: Handler>(&mut self, method: Method, path: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.router.add_route(method, path, handler)?;
        Ok(self)
    }

    pub fn get<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.add_route(Method::GET, path, handler)
    }

    pub fn post<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.add_route(Method::POST, path, handler)
    }

    pub fn put<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.add_route(Method::PUT, path, handler)
    }

    pub fn head<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.add_route(Method::HEAD, path, handler)
    }

    pub fn options<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.add_route(Method::OPTIONS, path, handler)
    }

    pub fn on_startup<H: Hook>(&mut self, hook: H) -> &mut Self {
        self.on_startup.push(Arc::new(hook));
        self
    }

    pub fn on_shutdown<H: Hook>(&mut self, hook: H) -> &mut Self {
        self.on_shutdown.push(Arc::new(hook));
        self
    }

    /// Runs every startup hook concurrently.
    ///
    /// Returns as soon as one hook fails; the remaining hooks are dropped.
    pub async fn startup(self: &Arc<Self>) -> anyhow::Result<()> {
        info!(hooks = self.on_startup.len(), "Running startup hooks");
        run_hooks(self, &self.on_startup).await
    }

    /// Runs every shutdown hook concurrently, with the same failure policy
    /// as [`Application::startup`].
    pub async fn shutdown(self: &Arc<Self>) -> anyhow::Result<()> {
        info!(hooks = self.on_shutdown.len(), "Running shutdown hooks");
        run_hooks(self, &self.on_shutdown).await
    }

    /// Dispatches `request` and passes the response to `writer`.
    ///
    /// Routing and handler failures never escape: they are already turned
    /// into a response by the time `writer` runs.
    pub async fn handle<W, Fut>(&self, request: Request, writer: W)
    where
        W: FnOnce(Response) -> Fut,
        Fut: Future<Output = ()>,
    {
        let response = self.dispatch(request).await;
        writer(response).await;
    }

    /// Routes `request` through the middleware chain to its handler and
    /// returns the response to send.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method();
        let path = request.raw_path().to_string();

        let response = match self.call_handler(request).await {
            Ok(response) => response,
            Err(Error::Http(exc)) => {
                debug!(method = %method, path = %path, status = exc.status_code().as_u16(), reason = %exc, "Request rejected");
                exc.to_response()
            }
            Err(Error::Internal(err)) => {
                error!(method = %method, path = %path, error = %err, "Handler failed");
                internal_error_response(&err.to_string(), &format!("{err:?}"))
            }
        };

        let response = if response.is_valid() {
            response
        } else {
            let status = response.status().as_u16();
            error!(method = %method, path = %path, status, "Handler returned an invalid response");
            internal_error_response(
                &format!("handler returned invalid status code {status}"),
                &format!("{response:?}"),
            )
        };

        info!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            "Request handled"
        );
        response
    }

    async fn call_handler(&self, mut request: Request) -> HandlerResult {
        let (match_info, handler) = self.router.resolve(&request)?;
        request.set_match_info(match_info);

        let handler = middleware::compose(&self.middlewares, handler);

        // The async block defers `call` so panics raised before the
        // handler's first await are caught as well.
        let outcome = AssertUnwindSafe(async move { handler.call(request).await })
            .catch_unwind()
            .await;

        outcome.unwrap_or_else(|panic| Err(Error::internal(format!("handler panicked: {}", panic_message(&*panic)))))
    }
}

async fn run_hooks(app: &Arc<Application>, hooks: &[Arc<dyn Hook>]) -> anyhow::Result<()> {
    try_join_all(hooks.iter().map(|hook| hook.call(Arc::clone(app)))).await?;
    Ok(())
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("router", &self.router)
            .field("middlewares", &self.middlewares.len())
            .field("on_startup", &self.on_startup.len())
            .field("on_shutdown", &self.on_shutdown.len())
            .finish()
    }
}

impl fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("policy", &self.policy)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
