//! Route table and matcher
//!
//! # Responsibilities
//! - Store registered routes per HTTP method, in registration order
//! - Compile templates at registration time (fail fast on bad patterns)
//! - Look up the matching route for an incoming method + path
//! - Extract path parameters from the winning match
//!
//! # Design Decisions
//! - Routes live in a `Vec` per method so iteration order is deterministic
//! - Re-registering a method+template replaces the entry in place
//!   (last registration wins; documented behavior, not an accident)
//! - Overlapping patterns are resolved by a literal-over-parameter rule:
//!   the match with the most literal segments wins, ties go to the
//!   earliest registration
//! - No route for a method is an empty slice, never an error

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use tracing::debug;

use crate::handler::Handler;
use crate::middleware::Middleware;
use crate::pattern::{PatternError, RoutePattern};

/// A registered route: method, compiled pattern, handler, and the route's
/// own middleware in registration order. Immutable once registered.
pub struct Route {
    method: Method,
    pattern: RoutePattern,
    handler: Arc<dyn Handler>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Route {
    /// The HTTP method this route is registered under
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw template this route was registered with
    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    /// The compiled pattern
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// The terminal handler
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Route-scoped middleware in registration order
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }
}

/// The result of a successful route lookup: the winning route and its
/// extracted path parameters.
pub struct RouteMatch<'r> {
    /// The matched route
    pub route: &'r Route,
    /// Path parameters, keyed by the pattern's declared names
    pub params: HashMap<String, String>,
}

/// Append-only mapping from HTTP method to registered routes.
///
/// Built single-threaded during application setup and read-only while
/// serving; the [`App`](crate::App) builder is consumed into an `Arc`
/// before the first request is dispatched, so lookups need no locking.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    ///
    /// The template is compiled immediately; a malformed template fails
    /// registration with a [`PatternError`]. Registering the same
    /// method+template again replaces the previous entry in place.
    pub fn add(
        &mut self,
        method: Method,
        template: &str,
        handler: Arc<dyn Handler>,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), PatternError> {
        let pattern = RoutePattern::compile(&method, template)?;
        let route = Route {
            method: method.clone(),
            pattern,
            handler,
            middleware,
        };

        let routes = self.routes.entry(method).or_default();
        if let Some(existing) = routes
            .iter_mut()
            .find(|existing| existing.template() == template)
        {
            debug!(template, "route re-registered, replacing previous entry");
            *existing = route;
        } else {
            routes.push(route);
        }

        Ok(())
    }

    /// All routes registered for a method, in registration order.
    /// An unregistered method yields an empty slice.
    pub fn routes_for(&self, method: &Method) -> &[Route] {
        self.routes.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find the route matching the incoming method and path.
    ///
    /// Every registered route for the method is tested; among the matches
    /// the one with the most literal segments wins, with ties going to the
    /// earliest-registered route. Returns `None` when nothing matches;
    /// the caller treats that as "not found", never as an error.
    pub fn find_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let mut best: Option<&Route> = None;

        for route in self.routes_for(method) {
            if !route.pattern.matches(method, path) {
                continue;
            }
            match best {
                Some(current)
                    if route.pattern.literal_segments()
                        <= current.pattern.literal_segments() => {}
                _ => best = Some(route),
            }
        }

        best.map(|route| RouteMatch {
            params: route.pattern.extract(method, path),
            route,
        })
    }
}

/// Split an incoming request target into path and query on the first `?`.
///
/// The query is `Some` (possibly empty) whenever a `?` is present, which is
/// what the param aggregator keys its "a query string was present" behavior
/// on.
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}
