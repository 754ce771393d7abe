//! Dispatcher: match, run, recover, finalize.

use axum::body::Bytes;
use axum::http::Request;
use axum::response::Response;
use std::fmt;

use crate::error::{RouteError, RouteResult};
use crate::http::context::{Handle, RequestContext};
use crate::http::response::{self, MatchedRoute};
use crate::observability::metrics;
use crate::routing::route::{Route, RouteGroup};
use crate::routing::router::{RouteMatch, Router};

/// How the before/route phase of a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The chain completed without error.
    Succeeded,
    /// The chain failed and an error handler recovered.
    Recovered,
    /// The chain failed and no error handler applied (or the handler itself failed).
    Unhandled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Recovered => write!(f, "recovered"),
            Self::Unhandled => write!(f, "unhandled"),
        }
    }
}

impl Router {
    /// Dispatch a request with no host handles.
    pub async fn handle(&self, request: Request<Bytes>) -> RouteResult<Response> {
        self.serve(request, None, None).await
    }

    /// Entry point for hosts: wrap the request and handles in a fresh context and dispatch.
    pub async fn serve(
        &self,
        request: Request<Bytes>,
        env: Option<Handle>,
        exec: Option<Handle>,
    ) -> RouteResult<Response> {
        self.dispatch(RequestContext::new(request, env, exec)).await
    }

    /// Dispatch an already-built context.
    pub async fn dispatch(&self, mut ctx: RequestContext) -> RouteResult<Response> {
        let Some(found) = self.find(ctx.method(), ctx.path()) else {
            tracing::warn!(method = %ctx.method(), path = %ctx.path(), "No route matched");
            return Ok(response::not_found());
        };
        let RouteMatch {
            index,
            route,
            group,
            params,
        } = found;

        tracing::debug!(
            method = %ctx.method(),
            path = %ctx.path(),
            route = %route.template(),
            "Dispatching request"
        );
        ctx.params = params;

        let (outcome, mut pending) = match self.route_chain(index).run(&mut ctx).await {
            Ok(()) => (Outcome::Succeeded, None),
            Err(err) => recover(route, group, err, &mut ctx).await,
        };

        if let Err(after_err) = self.after_chain(route.group).run(&mut ctx).await {
            match pending.as_mut() {
                Some(err) => {
                    tracing::warn!(
                        route = %route.template(),
                        error = %after_err,
                        "After-middleware failed while an error was pending; suppressed"
                    );
                    err.suppress(after_err);
                }
                None => {
                    tracing::error!(route = %route.template(), error = %after_err, "After-middleware failed");
                    metrics::record_error(&after_err, false);
                    pending = Some(after_err);
                }
            }
        }

        if let Some(err) = pending {
            tracing::error!(route = %route.template(), %outcome, error = %err, "Request failed");
            return Err(err);
        }

        let mut response = response::into_response(ctx.response)?;
        response
            .extensions_mut()
            .insert(MatchedRoute(route.template().to_string()));
        Ok(response)
    }
}

/// Look up route handlers, then group handlers; run the first that accepts `err`.
async fn recover(
    route: &Route,
    group: &RouteGroup,
    err: RouteError,
    ctx: &mut RequestContext,
) -> (Outcome, Option<RouteError>) {
    let handler = route
        .error_handlers
        .iter()
        .chain(&group.error_handlers)
        .find(|handler| handler.matcher.matches(&err));

    let Some(handler) = handler else {
        metrics::record_error(&err, false);
        return (Outcome::Unhandled, Some(err));
    };

    match (handler.action)(&err, ctx).await {
        Ok(()) => {
            tracing::info!(
                route = %route.template(),
                kind = %err.kind(),
                status = %ctx.response.status,
                "Error recovered by handler"
            );
            metrics::record_error(&err, true);
            (Outcome::Recovered, None)
        }
        Err(mut action_err) => {
            tracing::error!(route = %route.template(), error = %action_err, "Error handler failed");
            metrics::record_error(&err, false);
            action_err.suppress(err);
            (Outcome::Unhandled, Some(action_err))
        }
    }
}
