//! Edge router host (v1)
//!
//! Serves a demo route table through the router core.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     EDGE HOST                         │
//!   Client Request     │  ┌─────────┐    ┌─────────┐    ┌──────────────────┐  │
//!   ───────────────────┼─▶│  axum   │───▶│  serve  │───▶│ routing (match)  │  │
//!                      │  │ layers  │    │ buffer  │    └────────┬─────────┘  │
//!                      │  └─────────┘    └─────────┘             ▼            │
//!                      │                              ┌──────────────────┐    │
//!                      │                              │ before + route   │    │
//!                      │                              │ middleware chain │    │
//!                      │                              └────────┬─────────┘    │
//!                      │                          error ───────┤              │
//!                      │                    ┌─────────────┐    ▼              │
//!                      │                    │ error       │ ┌──────────────┐  │
//!                      │                    │ handlers    │▶│ after chain  │  │
//!                      │                    └─────────────┘ └──────┬───────┘  │
//!   Client Response    │  ┌─────────┐                              │          │
//!   ◀──────────────────┼──│response │◀─────────────────────────────┘          │
//!                      │  └─────────┘                                          │
//!                      │  Cross-cutting: config · observability · lifecycle    │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use axum::http::StatusCode;
use microroute::config::{load_config, ServerConfig};
use microroute::http::ExecutionContext;
use microroute::lifecycle::Shutdown;
use microroute::observability::{logging, metrics};
use microroute::{ErrorKind, HttpServer, RouteError, Router};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "microroute")]
#[command(about = "Edge router host serving a demo route table", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("microroute v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = demo_routes()?;
    for (method, template) in router.routes() {
        tracing::info!(method = %method, route = %template, "Route registered");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Route table served by the binary.
fn demo_routes() -> Result<Router, microroute::BuildError> {
    Router::builder()
        .group("/api")
        .with(|ctx, next| {
            Box::pin(async move {
                let start = Instant::now();
                let request_id = ctx.request_id().to_string();
                next.run(ctx).await?;
                ctx.header("x-request-id", &request_id)?;
                ctx.header("x-response-time-ms", &start.elapsed().as_millis().to_string())?;
                Ok(())
            })
        })
        .catch(ErrorKind::Syntax, StatusCode::BAD_REQUEST, "Malformed JSON")
        .get("/ping")
        .with(|ctx, next| {
            Box::pin(async move {
                ctx.text("pong");
                next.run(ctx).await
            })
        })
        .get("/users/:id")
        .catch(ErrorKind::Type, StatusCode::BAD_REQUEST, "Bad Input")
        .with(|ctx, next| {
            Box::pin(async move {
                let id: u64 = ctx
                    .param("id")
                    .unwrap_or_default()
                    .parse()
                    .map_err(|_| RouteError::type_error("user id must be numeric"))?;
                ctx.set_json(&serde_json::json!({ "id": id, "name": format!("user-{}", id) }))?;
                next.run(ctx).await
            })
        })
        .post("/echo")
        .with(|ctx, next| {
            Box::pin(async move {
                let payload: serde_json::Value = ctx.json()?;
                if let Some(exec) = ctx.exec::<ExecutionContext>() {
                    let size = ctx.request().body().len();
                    exec.wait_until(async move {
                        tracing::debug!(bytes = size, "Echo payload logged in background");
                    });
                }
                ctx.set_json(&payload)?;
                next.run(ctx).await
            })
        })
        .after_all()
        .with(|ctx, next| {
            Box::pin(async move {
                ctx.header("cache-control", "no-store")?;
                next.run(ctx).await
            })
        })
        .build()
}
