//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     builder.rs (group / on / use / catch calls, cursor-driven)
//!     → pattern.rs (compile each template once)
//!     → route.rs (group and route records)
//!     → router.rs (freeze, precompose chains)
//!
//! Incoming Request (method, path)
//!     → router.rs (linear scan in registration order)
//!     → pattern.rs (segment-wise match, bind params)
//!     → Return: RouteMatch or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in the hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod builder;
pub mod pattern;
pub mod route;
pub mod router;

pub use builder::RouterBuilder;
pub use pattern::{Params, Pattern};
pub use route::{ErrorHandler, ErrorMatch, Route, RouteGroup};
pub use router::{RouteMatch, Router};
