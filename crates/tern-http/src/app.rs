//! Application registration surface
//!
//! [`App`] is where routes and middleware are declared before serving
//! begins: one verb method per HTTP method, global `before`/`after`
//! middleware lists, a substitutable not-found fallback, and route groups.
//! Registration is single-threaded application setup; the `App` is then
//! moved into the [`Server`](crate::Server) (behind an `Arc`), making the
//! route table read-only for the whole serving lifetime.

use std::sync::Arc;

use futures::future::BoxFuture;
use http::{Method, StatusCode};

use crate::context::RequestContext;
use crate::error::HandlerResult;
use crate::group::Group;
use crate::handler::Handler;
use crate::middleware::Middleware;
use crate::pattern::PatternError;
use crate::router::Router;

/// Default not-found fallback: a fixed JSON payload with status 404.
fn default_not_found(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { ctx.json(StatusCode::NOT_FOUND, &"Not Found") })
}

/// The application: route table plus global middleware and the not-found
/// fallback.
pub struct App {
    pub(crate) router: Router,
    pub(crate) before: Vec<Arc<dyn Middleware>>,
    pub(crate) after: Vec<Arc<dyn Middleware>>,
    pub(crate) not_found: Arc<dyn Handler>,
}

impl App {
    /// Create an empty application
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            before: Vec::new(),
            after: Vec::new(),
            not_found: Arc::new(default_not_found),
        }
    }

    /// Register a GET route
    pub fn get(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::GET, template, Arc::new(handler), middleware.to_vec())
    }

    /// Register a POST route
    pub fn post(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::POST, template, Arc::new(handler), middleware.to_vec())
    }

    /// Register a PUT route
    pub fn put(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::PUT, template, Arc::new(handler), middleware.to_vec())
    }

    /// Register a PATCH route
    pub fn patch(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::PATCH, template, Arc::new(handler), middleware.to_vec())
    }

    /// Register a DELETE route
    pub fn delete(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::DELETE, template, Arc::new(handler), middleware.to_vec())
    }

    /// Register an OPTIONS route
    pub fn options(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::OPTIONS, template, Arc::new(handler), middleware.to_vec())
    }

    /// Register a route under an arbitrary method.
    ///
    /// Anything after a `?` in the template is ignored; only the path part
    /// is registered. Re-registering the same method+template replaces the
    /// previous entry (last registration wins).
    pub fn add(
        &mut self,
        method: Method,
        template: &str,
        handler: Arc<dyn Handler>,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), PatternError> {
        let (template, _) = template.split_once('?').unwrap_or((template, ""));
        self.router.add(method, template, handler, middleware)
    }

    /// Append a global middleware that wraps every matched route, outermost
    /// first in registration order.
    pub fn before(&mut self, middleware: Arc<dyn Middleware>) {
        self.before.push(middleware);
    }

    /// Append a global middleware that runs after the chain has completed
    /// and the response is committed, in registration order.
    pub fn after(&mut self, middleware: Arc<dyn Middleware>) {
        self.after.push(middleware);
    }

    /// Replace the not-found fallback handler
    pub fn not_found(&mut self, handler: impl Handler + 'static) {
        self.not_found = Arc::new(handler);
    }

    /// Start a route group: templates registered through it are prefixed
    /// with `prefix` and the group's middleware is prepended to each
    /// route's own.
    pub fn group<'a>(&'a mut self, prefix: &str, middleware: &[Arc<dyn Middleware>]) -> Group<'a> {
        Group::new(self, prefix, middleware)
    }

    /// The route table (read access, e.g. for tests and diagnostics)
    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
