//! Path-pattern routing.
//!
//! A pattern is a path with `{name}` placeholders, each capturing one or more
//! word characters. Everything else in the pattern must match literally and
//! the whole request path must be consumed.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::error::HttpException;
use crate::http::request::{MatchInfo, Method, Request};
use crate::web::handler::Handler;

static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?P<param>\w+)\}").expect("placeholder regex is valid"));

/// How [`Router::resolve`] walks the route table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The first registered route decides: if its pattern does not match the
    /// path, resolution fails without looking at later routes.
    #[default]
    FirstEntry,
    /// Every route is tried in registration order until one matches both
    /// path and method.
    Scan,
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid route pattern {path:?}: {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },
}

/// One entry of the route table.
pub struct Route {
    method: Method,
    path: String,
    pattern: Regex,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn method(&self) -> Method {
        self.method
    }

    /// The pattern as registered, e.g. `/users/{id}`.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn captures(&self, path: &str) -> Option<MatchInfo> {
        let caps = self.pattern.captures(path)?;
        Some(
            self.pattern
                .capture_names()
                .flatten()
                .filter_map(|name| caps.name(name).map(|m| (name, m.as_str())))
                .collect(),
        )
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Ordered route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    policy: MatchPolicy,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            routes: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Registers `handler` for `method` requests whose path matches `path`.
    ///
    /// Registering the same method and pattern twice replaces the earlier
    /// handler, keeping its position in the table.
    pub fn add_route<H: Handler>(&mut self, method: Method, path: &str, handler: H) -> Result<(), RouteError> {
        let pattern = compile_pattern(path).map_err(|source| RouteError::InvalidPattern {
            path: path.to_string(),
            source,
        })?;
        let handler: Arc<dyn Handler> = Arc::new(handler);

        match self
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.pattern.as_str() == pattern.as_str())
        {
            Some(existing) => {
                warn!(method = %method, path, "Route registered twice, replacing handler");
                existing.path = path.to_string();
                existing.handler = handler;
            }
            None => {
                debug!(method = %method, path, pattern = pattern.as_str(), "Route added");
                self.routes.push(Route {
                    method,
                    path: path.to_string(),
                    pattern,
                    handler,
                });
            }
        }
        Ok(())
    }

    pub fn add_get<H: Handler>(&mut self, path: &str, handler: H) -> Result<(), RouteError> {
        self.add_route(Method::GET, path, handler)
    }

    pub fn add_post<H: Handler>(&mut self, path: &str, handler: H) -> Result<(), RouteError> {
        self.add_route(Method::POST, path, handler)
    }

    pub fn add_put<H: Handler>(&mut self, path: &str, handler: H) -> Result<(), RouteError> {
        self.add_route(Method::PUT, path, handler)
    }

    pub fn add_head<H: Handler>(&mut self, path: &str, handler: H) -> Result<(), RouteError> {
        self.add_route(Method::HEAD, path, handler)
    }

    pub fn add_options<H: Handler>(&mut self, path: &str, handler: H) -> Result<(), RouteError> {
        self.add_route(Method::OPTIONS, path, handler)
    }

    /// Routes in match-attempt order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Finds the handler for `request` along with the captured parameters.
    ///
    /// A path that matches a route registered for another method is still a
    /// `404`, with a reason naming the rejected method.
    pub fn resolve(&self, request: &Request) -> Result<(MatchInfo, Arc<dyn Handler>), HttpException> {
        let path = request.raw_path();
        let method = request.method();

        let not_found = || HttpException::not_found(format!("Could not find {path}"));
        let not_allowed = || HttpException::not_found(format!("{method} not allowed for {path}"));

        match self.policy {
            MatchPolicy::FirstEntry => {
                let route = self.routes.first().ok_or_else(not_found)?;
                let match_info = route.captures(path).ok_or_else(not_found)?;

                if route.method != method {
                    return Err(not_allowed());
                }
                Ok((match_info, Arc::clone(&route.handler)))
            }

            MatchPolicy::Scan => {
                let mut path_matched = false;

                for route in &self.routes {
                    let Some(match_info) = route.captures(path) else {
                        continue;
                    };
                    if route.method == method {
                        return Ok((match_info, Arc::clone(&route.handler)));
                    }
                    path_matched = true;
                }

                Err(if path_matched { not_allowed() } else { not_found() })
            }
        }
    }
}

/// Turns `/users/{id}` into `^/users/(?P<id>\w+)$`.
fn compile_pattern(path: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("^");
    let mut last = 0;

    for caps in PARAM_RE.captures_iter(path) {
        let (Some(whole), Some(param)) = (caps.get(0), caps.name("param")) else {
            continue;
        };
        pattern.push_str(&regex::escape(&path[last..whole.start()]));
        pattern.push_str(&format!(r"(?P<{}>\w+)", param.as_str()));
        last = whole.end();
    }

    pattern.push_str(&regex::escape(&path[last..]));
    pattern.push('$');

    Regex::new(&pattern)
}
