//! Middleware model.
//!
//! # Data Flow
//! ```text
//! compose([A, B, C])(ctx)
//!     → A(ctx, next₁)
//!         → next₁.run(ctx) → B(ctx, next₂)
//!             → next₂.run(ctx) → C(ctx, next₃)
//!                 → next₃.run(ctx) → Ok(())
//!     ← control returns to A after B (and C) complete
//! ```
//!
//! # Design Decisions
//! - `Next` borrows the remaining chain; no allocation per hop beyond the boxed future
//! - Not running `next` short-circuits the rest of the chain and is not an error
//! - An `Err` from any middleware unwinds straight back to the caller of the chain

pub mod compose;

pub use compose::{compose, Chain};

use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::error::{RouteError, RouteResult};
use crate::http::context::RequestContext;

/// A unit of request processing.
pub trait Middleware: Send + Sync + 'static {
    /// Process the request, optionally continuing with `next`.
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, RouteResult<()>>;
}

/// Shared middleware handle as stored in groups and routes.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Continuation over the rest of a middleware chain.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [BoxedMiddleware],
}

impl<'a> Next<'a> {
    pub(crate) fn new(rest: &'a [BoxedMiddleware]) -> Self {
        Self { rest }
    }

    /// Run the remaining middleware. Resolves immediately at the end of the chain.
    pub fn run<'c>(self, ctx: &'c mut RequestContext) -> BoxFuture<'c, RouteResult<()>>
    where
        'a: 'c,
    {
        match self.rest.split_first() {
            Some((head, rest)) => head.call(ctx, Next::new(rest)),
            None => Box::pin(async { Ok::<(), RouteError>(()) }),
        }
    }

    /// Number of middleware still to run.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// Middleware built from a closure.
pub struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, RouteResult<()>> {
        (self.0)(ctx, next)
    }
}

/// Create middleware from a closure returning a boxed future.
///
/// # Example
/// ```rust,ignore
/// let timing = from_fn(|ctx, next| Box::pin(async move {
///     let start = std::time::Instant::now();
///     next.run(ctx).await?;
///     ctx.header("x-elapsed-ms", &start.elapsed().as_millis().to_string())?;
///     Ok(())
/// }));
/// ```
pub fn from_fn<F>(f: F) -> BoxedMiddleware
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware(f))
}

/// Action run by an error handler once its predicate has selected an error.
pub type ErrorAction =
    Arc<dyn for<'a> Fn(&'a RouteError, &'a mut RequestContext) -> BoxFuture<'a, RouteResult<()>> + Send + Sync>;
