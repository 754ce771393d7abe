//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Build route table → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Trigger or signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The route table is built before the listener binds (traffic only when ready)
//! - Tests stop servers through `Shutdown`, processes through signals

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
