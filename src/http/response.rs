//! Response assembly.
//!
//! # Responsibilities
//! - Turn the context's `ResponseState` into an HTTP response
//! - Serialize structured bodies and pick the content type
//! - Carry the status text as the HTTP/1 reason phrase
//!
//! # Design Decisions
//! - JSON bodies default to `application/json`, text to `text/plain; charset=utf-8`
//! - A content type set by middleware is never overwritten
//! - A status text that is not a valid reason phrase is dropped, not an error

use axum::body::Body as HttpBody;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use hyper::ext::ReasonPhrase;

use crate::error::RouteResult;
use crate::http::context::{Body, ResponseState};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Template of the route that produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

impl MatchedRoute {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Build the outbound response from the final response state.
pub fn into_response(state: ResponseState) -> RouteResult<Response> {
    let ResponseState {
        body,
        status,
        status_text,
        mut headers,
    } = state;

    let (bytes, content_type) = match body {
        Body::Json(value) => (serde_json::to_vec(&value)?, CONTENT_TYPE_JSON),
        Body::Text(text) => (text.into_bytes(), CONTENT_TYPE_TEXT),
    };
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }

    let mut response = Response::new(HttpBody::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    if status.canonical_reason() != Some(status_text.as_str()) && !status_text.is_empty() {
        match ReasonPhrase::try_from(status_text.into_bytes()) {
            Ok(reason) => {
                response.extensions_mut().insert(reason);
            }
            Err(_) => tracing::debug!(status = %status, "Status text is not a valid reason phrase; dropped"),
        }
    }

    Ok(response)
}

/// Plain `404 Not Found` returned when no route matches.
pub fn not_found() -> Response {
    let mut response = Response::new(HttpBody::from("Not found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_TEXT));
    response
}
