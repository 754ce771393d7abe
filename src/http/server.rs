//! HTTP server hosting a route table.
//!
//! # Responsibilities
//! - Create the Axum app that feeds every request to the route table
//! - Wire up hosting middleware (tracing, timeout, body limit, request ID)
//! - Buffer request bodies and hand requests to `Router::serve`
//! - Turn unhandled route errors into `500 Internal Server Error`
//! - Record request metrics
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - Bodies over `max_body_size` get `413` whether or not a Content-Length was sent

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, FromRequest, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::context::{Handle, X_REQUEST_ID};
use crate::http::response::MatchedRoute;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::routing::Router;

/// Execution handle given to every request: lets middleware run work past the response.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext;

impl ExecutionContext {
    /// Run `task` in the background; the response does not wait for it.
    pub fn wait_until<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(task);
    }
}

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub env: Option<Handle>,
}

/// HTTP server for a frozen route table.
pub struct HttpServer {
    app: axum::Router,
}

impl HttpServer {
    /// Create a server with no environment handle.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self::with_env(config, router, None)
    }

    /// Create a server that passes `env` to every request.
    pub fn with_env(config: ServerConfig, router: Router, env: Option<Handle>) -> Self {
        let state = AppState {
            router: Arc::new(router),
            env,
        };
        let app = Self::build_app(&config, state);
        Self { app }
    }

    /// Build the Axum app with all hosting layers.
    #[allow(deprecated)]
    fn build_app(config: &ServerConfig, state: AppState) -> axum::Router {
        let request_id = header::HeaderName::from_static(X_REQUEST_ID);

        axum::Router::new()
            .fallback(edge_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::SERVER,
                HeaderValue::from_static("microroute"),
            ))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The Axum app, for embedding or in-process testing.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = shutdown_signal() => {},
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the body, dispatch through the route table, map unhandled errors to 500.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let (parts, body) = request.into_parts();
    let mut buffered = Request::new(body);
    *buffered.extensions_mut() = parts.extensions.clone();
    let bytes = match Bytes::from_request(buffered, &state).await {
        Ok(bytes) => bytes,
        Err(rejection) => {
            let status = rejection.status();
            tracing::warn!(
                method = %method,
                path = %path,
                status = %status,
                error = %rejection.body_text(),
                "Failed to read request body"
            );
            metrics::record_request(&method, status.as_u16(), "none", start_time);
            return rejection.into_response();
        }
    };

    let exec: Handle = Arc::new(ExecutionContext);
    match state
        .router
        .serve(Request::from_parts(parts, bytes), state.env.clone(), Some(exec))
        .await
    {
        Ok(response) => {
            let route = response
                .extensions()
                .get::<MatchedRoute>()
                .map(|r| r.as_str().to_string())
                .unwrap_or_else(|| "none".to_string());
            metrics::record_request(&method, response.status().as_u16(), &route, start_time);
            response
        }
        Err(err) => {
            tracing::error!(
                method = %method,
                path = %path,
                kind = %err.kind(),
                error = %err,
                suppressed = err.suppressed().len(),
                "Unhandled route error"
            );
            metrics::record_request(&method, 500, "unhandled", start_time);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
