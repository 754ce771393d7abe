//! Middleware composition.

use crate::error::RouteResult;
use crate::http::context::RequestContext;
use crate::middleware::{BoxedMiddleware, Next};

/// An ordered middleware list that runs as one unit.
#[derive(Clone, Default)]
pub struct Chain {
    middleware: Vec<BoxedMiddleware>,
}

impl Chain {
    /// Run the chain. The first middleware is invoked with a `Next` over the rest.
    pub async fn run(&self, ctx: &mut RequestContext) -> RouteResult<()> {
        Next::new(&self.middleware).run(ctx).await
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

/// Compose middleware in the given order.
pub fn compose<I>(middleware: I) -> Chain
where
    I: IntoIterator<Item = BoxedMiddleware>,
{
    Chain {
        middleware: middleware.into_iter().collect(),
    }
}
