//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for production)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all subsystems via `x-request-id`
//! - Metric updates are no-ops until an exporter is installed
//! - `RUST_LOG` always wins over the configured log level

pub mod logging;
pub mod metrics;
