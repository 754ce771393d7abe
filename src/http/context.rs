//! Per-request state threaded through the middleware chain.
//!
//! # Responsibilities
//! - Own the inbound request for the lifetime of one dispatch
//! - Carry opaque environment handles from the host untouched
//! - Hold route parameters bound at match time
//! - Hold the mutable response that middleware and error handlers shape
//!
//! # Design Decisions
//! - Created fresh for every request; nothing in it is shared across requests
//! - Host handles are type-erased and only reachable through typed downcasts
//! - The response starts as `200 OK` with an empty JSON object body

use axum::body::Bytes;
use axum::http::{header::HeaderName, HeaderMap, HeaderValue, Extensions, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{RouteError, RouteResult};
use crate::routing::pattern::Params;

/// Header carrying the correlation ID assigned by the host.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Opaque value handed in by the host (bindings, execution context).
pub type Handle = Arc<dyn Any + Send + Sync>;

/// Response body before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured body, serialized as JSON.
    Json(serde_json::Value),
    /// Raw text body.
    Text(String),
}

impl Default for Body {
    fn default() -> Self {
        Body::Json(serde_json::Value::Object(serde_json::Map::new()))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

/// Response fields mutated in place by middleware.
#[derive(Debug, Clone)]
pub struct ResponseState {
    pub body: Body,
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            body: Body::default(),
            status: StatusCode::OK,
            status_text: "OK".to_string(),
            headers: HeaderMap::new(),
        }
    }
}

/// Mutable per-request context.
pub struct RequestContext {
    request: Request<Bytes>,
    env: Option<Handle>,
    exec: Option<Handle>,
    request_id: Option<String>,
    /// Parameters bound from the matched route template.
    pub params: Params,
    /// Response under construction.
    pub response: ResponseState,
    /// Typed values shared between middleware of the same request.
    pub locals: Extensions,
}

impl RequestContext {
    pub fn new(request: Request<Bytes>, env: Option<Handle>, exec: Option<Handle>) -> Self {
        Self {
            request,
            env,
            exec,
            request_id: None,
            params: Params::new(),
            response: ResponseState::default(),
            locals: Extensions::new(),
        }
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Path component of the request URI, without the query string.
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Environment handle, if the host supplied one of type `T`.
    pub fn env<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.env.as_deref().and_then(|env| env.downcast_ref::<T>())
    }

    /// Execution-context handle, if the host supplied one of type `T`.
    pub fn exec<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.exec.as_deref().and_then(|exec| exec.downcast_ref::<T>())
    }

    /// Correlation ID from `x-request-id`, or a UUID generated on first use.
    pub fn request_id(&mut self) -> &str {
        if self.request_id.is_none() {
            let id = self
                .request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            self.request_id = Some(id);
        }
        self.request_id.as_deref().unwrap_or_default()
    }

    /// Decode the request body as JSON. Malformed input is a syntax error.
    pub fn json<T: DeserializeOwned>(&self) -> RouteResult<T> {
        Ok(serde_json::from_slice(self.request.body())?)
    }

    /// Replace the response body with text.
    pub fn text(&mut self, body: impl Into<String>) -> &mut Self {
        self.response.body = Body::Text(body.into());
        self
    }

    /// Replace the response body with a serialized value.
    pub fn set_json<T: Serialize>(&mut self, body: &T) -> RouteResult<&mut Self> {
        self.response.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set status and the matching canonical status text.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.response.status = status;
        self.response.status_text = status.canonical_reason().unwrap_or_default().to_string();
        self
    }

    /// Set a response header, replacing any previous value.
    pub fn header(&mut self, name: &str, value: &str) -> RouteResult<&mut Self> {
        let header = HeaderName::try_from(name)
            .map_err(|e| RouteError::type_error(format!("invalid header name {}", name)).with_source(e))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| RouteError::type_error(format!("invalid value for header {}", name)).with_source(e))?;
        self.response.headers.insert(header, value);
        Ok(self)
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", self.method())
            .field("path", &self.path())
            .field("params", &self.params)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}
