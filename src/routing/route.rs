//! Route table records.
//!
//! # Responsibilities
//! - Describe groups (prefix, before/after middleware, error handlers)
//! - Describe routes (method, template, compiled pattern, own middleware and handlers)
//! - Decide whether an error handler applies to a raised error
//!
//! # Design Decisions
//! - A route refers to its group by index; the router owns both tables
//! - Error handlers are selected by `ErrorMatch`, the action never re-checks

use axum::http::Method;
use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorKind, RouteError};
use crate::middleware::{BoxedMiddleware, ErrorAction};
use crate::routing::pattern::Pattern;

/// Predicate deciding which errors an error handler accepts.
#[derive(Clone)]
pub enum ErrorMatch {
    /// Every error.
    Any,
    /// Errors of exactly this kind.
    Kind(ErrorKind),
    /// Errors accepted by a custom test.
    Where(Arc<dyn Fn(&RouteError) -> bool + Send + Sync>),
}

impl ErrorMatch {
    pub fn matches(&self, err: &RouteError) -> bool {
        match self {
            Self::Any => true,
            Self::Kind(kind) => err.kind() == *kind,
            Self::Where(test) => test(err),
        }
    }

    /// Custom predicate over the raised error.
    pub fn when<F>(test: F) -> Self
    where
        F: Fn(&RouteError) -> bool + Send + Sync + 'static,
    {
        Self::Where(Arc::new(test))
    }
}

impl From<ErrorKind> for ErrorMatch {
    fn from(kind: ErrorKind) -> Self {
        Self::Kind(kind)
    }
}

impl fmt::Debug for ErrorMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Self::Where(_) => write!(f, "Where(..)"),
        }
    }
}

/// Error predicate paired with its recovery action.
#[derive(Clone)]
pub struct ErrorHandler {
    pub matcher: ErrorMatch,
    pub action: ErrorAction,
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler").field("matcher", &self.matcher).finish_non_exhaustive()
    }
}

/// Scope shared by every route registered under it.
#[derive(Clone, Default)]
pub struct RouteGroup {
    pub prefix: String,
    pub before: Vec<BoxedMiddleware>,
    pub after: Vec<BoxedMiddleware>,
    pub error_handlers: Vec<ErrorHandler>,
}

impl RouteGroup {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for RouteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup")
            .field("prefix", &self.prefix)
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("error_handlers", &self.error_handlers)
            .finish()
    }
}

/// One method + path endpoint.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: Pattern,
    /// Index of the owning group in the router's group table.
    pub group: usize,
    pub middleware: Vec<BoxedMiddleware>,
    pub error_handlers: Vec<ErrorHandler>,
}

impl Route {
    pub fn template(&self) -> &str {
        self.pattern.template()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template())
            .field("group", &self.group)
            .field("middleware", &self.middleware.len())
            .field("error_handlers", &self.error_handlers)
            .finish()
    }
}
