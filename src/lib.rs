//! Minimal async HTTP router and middleware composer for edge-function style servers.
//!
//! A request is matched against a route table built once at startup, then run
//! through the matched group's before-middleware and the route's middleware.
//! Errors raised along the way are offered to route and group error handlers;
//! the group's after-middleware always runs last.
//!
//! ```rust,ignore
//! use microroute::{ErrorKind, RouteError, Router};
//! use axum::http::StatusCode;
//!
//! let router = Router::builder()
//!     .group("/api")
//!     .get("/users/:id")
//!     .catch(ErrorKind::Type, StatusCode::BAD_REQUEST, "Bad Input")
//!     .with(|ctx, next| Box::pin(async move {
//!         let id: u64 = ctx.param("id").unwrap_or_default().parse()
//!             .map_err(|_| RouteError::type_error("id must be numeric"))?;
//!         ctx.set_json(&serde_json::json!({ "id": id }))?;
//!         next.run(ctx).await
//!     }))
//!     .build()?;
//!
//! let response = router.handle(request).await?;
//! ```

// Core
pub mod dispatch;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routing;

// Hosting and cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use dispatch::Outcome;
pub use error::{BuildError, ErrorKind, RouteError, RouteResult};
pub use http::{Body, HttpServer, RequestContext, ResponseState};
pub use middleware::{compose, from_fn, Middleware, Next};
pub use routing::{ErrorMatch, Router, RouterBuilder};
