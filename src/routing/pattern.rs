//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Compile a route template (`/users/:id`) into literal and parameter segments
//! - Match a concrete request path segment by segment
//! - Extract named parameters on a successful match
//!
//! # Design Decisions
//! - Templates and paths are split on `/` with empty segments discarded, so
//!   `/a//b/` and `/a/b` are equivalent
//! - Segment counts must be equal; there are no wildcards
//! - Literal segments are compared case-sensitively
//! - Parameter values are bound verbatim (no percent-decoding)
//! - A repeated parameter name keeps the last bound value

use std::collections::HashMap;
use std::fmt;

/// Marker that turns a template segment into a named parameter.
pub const PARAM_MARKER: char = ':';

/// Parameters extracted from a matched path, keyed by name.
pub type Params = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a template. Every template is valid; a bare `:` binds a parameter
    /// with an empty name.
    pub fn compile(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = split_segments(&template)
            .map(|segment| match segment.strip_prefix(PARAM_MARKER) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self { template, segments }
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names of the parameters in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a request path, returning the bound parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = split_segments(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
            }
        }
        Some(params)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
