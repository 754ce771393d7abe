//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, hosting layers, body buffering)
//!     → context.rs (RequestContext: request, handles, params, response state)
//!     → [dispatch runs the matched route's middleware]
//!     → response.rs (serialize body, content type, reason phrase)
//!     → Send to client
//! ```

pub mod context;
pub mod response;
pub mod server;

pub use context::{Body, Handle, RequestContext, ResponseState, X_REQUEST_ID};
pub use response::MatchedRoute;
pub use server::{ExecutionContext, HttpServer};
