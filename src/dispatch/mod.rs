//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request (method, path, body) + host handles
//!     → RequestContext (fresh per request)
//!     → router.find (no match → 404, no middleware runs)
//!     → group.before + route.middleware chain
//!         ├─ Ok                    → Succeeded
//!         └─ Err → route handlers, then group handlers (first match wins)
//!               ├─ handler found   → Recovered
//!               └─ none            → Unhandled
//!     → group.after chain (always, exactly once)
//!     → Responded, or Rethrown when an error is still pending
//! ```
//!
//! # Design Decisions
//! - After-middleware has finally-semantics and sees whatever state the
//!   before/route phase left behind
//! - Unhandled errors are returned to the caller, never turned into a response here
//! - An after-chain error never replaces an error that is already pending;
//!   it is attached to it as suppressed

pub mod dispatcher;

pub use dispatcher::Outcome;
