//! Error types for route execution and route-table construction.
//!
//! # Responsibilities
//! - Define the error value middleware and error handlers raise (`RouteError`)
//! - Classify errors by an explicit, comparable kind (`ErrorKind`)
//! - Report builder misuse as an explicit precondition failure (`BuildError`)
//!
//! # Design Decisions
//! - Error handlers select errors by `ErrorKind` equality, never by downcasting
//! - The underlying cause is kept as a boxed `source` for logging
//! - Errors that lose a race with an in-flight error are kept as `suppressed`

use std::fmt;
use thiserror::Error;

/// Result alias used by middleware, error handlers and the dispatcher.
pub type RouteResult<T> = Result<T, RouteError>;

/// Boxed error cause attached to a [`RouteError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification used by error handlers to decide whether they apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value had the wrong shape or type.
    Type,
    /// A value was outside its permitted range.
    Range,
    /// Input could not be parsed (malformed JSON, bad encoding).
    Syntax,
    /// Input parsed but failed a semantic check.
    Validation,
    /// Caller is not authenticated.
    Unauthorized,
    /// Caller is authenticated but not allowed.
    Forbidden,
    /// Request conflicts with current state.
    Conflict,
    /// Anything else that went wrong inside a handler.
    Internal,
    /// Application-defined kind, compared by name.
    Custom(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => write!(f, "type"),
            Self::Range => write!(f, "range"),
            Self::Syntax => write!(f, "syntax"),
            Self::Validation => write!(f, "validation"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal => write!(f, "internal"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Error raised while running a route's middleware chain.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct RouteError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
    suppressed: Vec<RouteError>,
}

impl RouteError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            suppressed: Vec::new(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Range, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Record an error that was raised while this one was already propagating.
    pub fn suppress(&mut self, other: RouteError) {
        self.suppressed.push(other);
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Errors raised later in the same request and superseded by this one.
    pub fn suppressed(&self) -> &[RouteError] {
        &self.suppressed
    }
}

impl From<serde_json::Error> for RouteError {
    fn from(err: serde_json::Error) -> Self {
        RouteError::syntax(err.to_string()).with_source(err)
    }
}

/// Misuse of the route builder, reported by `RouterBuilder::build`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A call that needs an open group or route was made before any existed.
    #[error("`{operation}` called with no open group; call `group` or a route registrar first")]
    NoOpenGroup { operation: &'static str },
}
