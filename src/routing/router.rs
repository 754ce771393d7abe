//! Frozen route table and route lookup.
//!
//! # Responsibilities
//! - Store groups and routes produced by the builder
//! - Hold each route's precomposed before + route chain and each group's after-chain
//! - Look up the first route matching a method and path
//!
//! # Design Decisions
//! - Immutable after construction (shared across requests without locks)
//! - O(n) scan in registration order; first match wins, no priorities
//! - Explicit no-match (`None`) rather than a silent default route

use axum::http::Method;

use crate::middleware::{compose, Chain};
use crate::routing::builder::RouterBuilder;
use crate::routing::pattern::Params;
use crate::routing::route::{Route, RouteGroup};

/// A route selected for a request.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    pub index: usize,
    pub route: &'r Route,
    pub group: &'r RouteGroup,
    pub params: Params,
}

/// Immutable route table.
pub struct Router {
    groups: Vec<RouteGroup>,
    routes: Vec<Route>,
    route_chains: Vec<Chain>,
    after_chains: Vec<Chain>,
}

impl Router {
    /// Start building a route table.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub(crate) fn new(groups: Vec<RouteGroup>, routes: Vec<Route>) -> Self {
        let route_chains = routes
            .iter()
            .map(|route| {
                let group = &groups[route.group];
                compose(group.before.iter().chain(&route.middleware).cloned())
            })
            .collect();
        let after_chains = groups.iter().map(|group| compose(group.after.iter().cloned())).collect();

        Self {
            groups,
            routes,
            route_chains,
            after_chains,
        }
    }

    /// Find the first route registered for `method` whose pattern matches `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().enumerate().find_map(|(index, route)| {
            if route.method != *method {
                return None;
            }
            let params = route.pattern.matches(path)?;
            Some(RouteMatch {
                index,
                route,
                group: &self.groups[route.group],
                params,
            })
        })
    }

    /// Registered routes as `(method, template)` in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|route| (&route.method, route.template()))
    }

    pub fn route_list(&self) -> &[Route] {
        &self.routes
    }

    pub fn groups(&self) -> &[RouteGroup] {
        &self.groups
    }

    /// Group before-middleware followed by the route's own middleware.
    pub(crate) fn route_chain(&self, index: usize) -> &Chain {
        &self.route_chains[index]
    }

    pub(crate) fn after_chain(&self, group: usize) -> &Chain {
        &self.after_chains[group]
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("groups", &self.groups)
            .field("routes", &self.routes)
            .finish()
    }
}
