//! Fluent route-table builder.
//!
//! # Responsibilities
//! - Accumulate groups and routes in registration order
//! - Track where the next middleware or error handler is appended (the cursor)
//! - Open an anonymous root group when a route is registered outside any group
//! - Freeze the table into an immutable `Router`
//!
//! # Design Decisions
//! - Every call returns the builder so registrations chain
//! - Misuse (appending with nothing open) is recorded and reported by `build`
//! - The cursor lives only in the builder; `build` consumes it
//!
//! # Cursor Transitions
//! ```text
//! group(p)        → { group: new,  route: none, chain: group.before }
//! on(m, p)        → { group: open, route: new,  chain: route.middleware }
//! before_all()    → { group: open, route: none, chain: group.before }
//! after_all()     → { group: open, route: none, chain: group.after }
//! ```

use axum::http::{Method, StatusCode};
use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::error::{BuildError, RouteError, RouteResult};
use crate::http::context::{Body, RequestContext};
use crate::middleware::{from_fn, BoxedMiddleware, ErrorAction, Middleware, Next};
use crate::routing::pattern::Pattern;
use crate::routing::route::{ErrorHandler, ErrorMatch, Route, RouteGroup};
use crate::routing::router::Router;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    GroupBefore(usize),
    GroupAfter(usize),
    Route(usize),
}

#[derive(Debug, Default)]
struct Cursor {
    group: Option<usize>,
    route: Option<usize>,
    chain: Option<Slot>,
}

/// Builder for a [`Router`].
///
/// # Example
/// ```rust,ignore
/// let router = Router::builder()
///     .group("/api")
///     .with(|ctx, next| Box::pin(async move {
///         ctx.header("x-api", "1")?;
///         next.run(ctx).await
///     }))
///     .catch(ErrorKind::Syntax, StatusCode::BAD_REQUEST, "Bad Input")
///     .get("/ping")
///     .with(|ctx, next| Box::pin(async move {
///         ctx.text("pong");
///         next.run(ctx).await
///     }))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RouterBuilder {
    groups: Vec<RouteGroup>,
    routes: Vec<Route>,
    cursor: Cursor,
    error: Option<BuildError>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new group. Routes registered next are prefixed with `prefix`.
    pub fn group(mut self, prefix: impl Into<String>) -> Self {
        let index = self.open_group(prefix.into());
        self.cursor = Cursor {
            group: Some(index),
            route: None,
            chain: Some(Slot::GroupBefore(index)),
        };
        self
    }

    /// Register a route in the open group, opening an anonymous root group if needed.
    pub fn on(mut self, method: Method, path: &str) -> Self {
        let group = match self.cursor.group {
            Some(group) => group,
            None => self.open_group(String::new()),
        };

        let template = format!("{}{}", self.groups[group].prefix, path);
        tracing::trace!(method = %method, template = %template, "Registering route");

        let index = self.routes.len();
        self.routes.push(Route {
            method,
            pattern: Pattern::compile(template),
            group,
            middleware: Vec::new(),
            error_handlers: Vec::new(),
        });
        self.cursor = Cursor {
            group: Some(group),
            route: Some(index),
            chain: Some(Slot::Route(index)),
        };
        self
    }

    pub fn get(self, path: &str) -> Self {
        self.on(Method::GET, path)
    }

    pub fn post(self, path: &str) -> Self {
        self.on(Method::POST, path)
    }

    pub fn put(self, path: &str) -> Self {
        self.on(Method::PUT, path)
    }

    pub fn patch(self, path: &str) -> Self {
        self.on(Method::PATCH, path)
    }

    pub fn delete(self, path: &str) -> Self {
        self.on(Method::DELETE, path)
    }

    pub fn options(self, path: &str) -> Self {
        self.on(Method::OPTIONS, path)
    }

    pub fn head(self, path: &str) -> Self {
        self.on(Method::HEAD, path)
    }

    /// Append middleware to the current chain.
    pub fn middleware(mut self, middleware: BoxedMiddleware) -> Self {
        match self.cursor.chain {
            Some(Slot::GroupBefore(group)) => self.groups[group].before.push(middleware),
            Some(Slot::GroupAfter(group)) => self.groups[group].after.push(middleware),
            Some(Slot::Route(route)) => self.routes[route].middleware.push(middleware),
            None => self.fail(BuildError::NoOpenGroup { operation: "use" }),
        }
        self
    }

    /// Append a middleware value to the current chain.
    pub fn layer<M: Middleware>(self, middleware: M) -> Self {
        self.middleware(Arc::new(middleware))
    }

    /// Append each middleware in order.
    pub fn use_all<I>(self, middleware: I) -> Self
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        middleware.into_iter().fold(self, |builder, mw| builder.middleware(mw))
    }

    /// Append a closure middleware to the current chain.
    pub fn with<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        self.middleware(from_fn(f))
    }

    // Readability aliases for `with`.

    pub fn then<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        self.with(f)
    }

    pub fn when<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        self.with(f)
    }

    pub fn include<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        self.with(f)
    }

    pub fn require<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        self.with(f)
    }

    pub fn ensure<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        self.with(f)
    }

    pub fn attach<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        self.with(f)
    }

    /// Point the cursor at the open group's before-chain.
    pub fn before_all(mut self) -> Self {
        match self.cursor.group {
            Some(group) => {
                self.cursor = Cursor {
                    group: Some(group),
                    route: None,
                    chain: Some(Slot::GroupBefore(group)),
                }
            }
            None => self.fail(BuildError::NoOpenGroup { operation: "before_all" }),
        }
        self
    }

    /// Point the cursor at the open group's after-chain.
    pub fn after_all(mut self) -> Self {
        match self.cursor.group {
            Some(group) => {
                self.cursor = Cursor {
                    group: Some(group),
                    route: None,
                    chain: Some(Slot::GroupAfter(group)),
                }
            }
            None => self.fail(BuildError::NoOpenGroup { operation: "after_all" }),
        }
        self
    }

    /// Register an error handler on the open route, or on the open group if no route is open.
    pub fn register_error_handler<E, F>(mut self, matcher: E, action: F) -> Self
    where
        E: Into<ErrorMatch>,
        F: for<'a> Fn(&'a RouteError, &'a mut RequestContext) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        let handler = ErrorHandler {
            matcher: matcher.into(),
            action: Arc::new(action) as ErrorAction,
        };
        match (self.cursor.route, self.cursor.group) {
            (Some(route), _) => self.routes[route].error_handlers.push(handler),
            (None, Some(group)) => self.groups[group].error_handlers.push(handler),
            (None, None) => self.fail(BuildError::NoOpenGroup {
                operation: "register_error_handler",
            }),
        }
        self
    }

    /// Register a handler that accepts every error.
    pub fn catch_any<F>(self, action: F) -> Self
    where
        F: for<'a> Fn(&'a RouteError, &'a mut RequestContext) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
    {
        self.register_error_handler(ErrorMatch::Any, action)
    }

    /// Recover matching errors with a fixed status and message.
    ///
    /// The response status, status text and body are all overwritten. The
    /// matcher only selects the handler; the action itself applies unconditionally.
    pub fn catch<E>(self, matcher: E, status: StatusCode, message: impl Into<String>) -> Self
    where
        E: Into<ErrorMatch>,
    {
        let message: String = message.into();
        self.register_error_handler(matcher, move |_err, ctx| {
            ctx.response.status = status;
            ctx.response.status_text = message.clone();
            ctx.response.body = Body::Text(message.clone());
            Box::pin(async { Ok(()) })
        })
    }

    /// Freeze the route table.
    pub fn build(self) -> Result<Router, BuildError> {
        if let Some(err) = self.error {
            tracing::error!(error = %err, "Route table rejected");
            return Err(err);
        }

        tracing::debug!(
            groups = self.groups.len(),
            routes = self.routes.len(),
            "Route table built"
        );
        Ok(Router::new(self.groups, self.routes))
    }

    fn open_group(&mut self, prefix: String) -> usize {
        self.groups.push(RouteGroup::new(prefix));
        self.groups.len() - 1
    }

    fn fail(&mut self, err: BuildError) {
        tracing::warn!(error = %err, "Invalid route registration");
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}
