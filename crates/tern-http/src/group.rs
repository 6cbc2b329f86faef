//! Route groups
//!
//! A group prefixes every template registered through it and prepends its
//! shared middleware to each route's own, then delegates to the
//! application's `add`.

use std::sync::Arc;

use http::Method;

use crate::app::App;
use crate::handler::Handler;
use crate::middleware::Middleware;
use crate::pattern::PatternError;

/// A set of routes sharing a template prefix and middleware.
pub struct Group<'a> {
    app: &'a mut App,
    prefix: String,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl<'a> Group<'a> {
    pub(crate) fn new(app: &'a mut App, prefix: &str, middleware: &[Arc<dyn Middleware>]) -> Self {
        Self {
            app,
            prefix: prefix.to_string(),
            middleware: middleware.to_vec(),
        }
    }

    /// Register a GET route under the group
    pub fn get(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::GET, template, handler, middleware)
    }

    /// Register a POST route under the group
    pub fn post(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::POST, template, handler, middleware)
    }

    /// Register a PATCH route under the group
    pub fn patch(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::PATCH, template, handler, middleware)
    }

    /// Register a PUT route under the group
    pub fn put(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::PUT, template, handler, middleware)
    }

    /// Register a DELETE route under the group
    pub fn delete(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        self.add(Method::DELETE, template, handler, middleware)
    }

    fn add(
        &mut self,
        method: Method,
        template: &str,
        handler: impl Handler + 'static,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), PatternError> {
        let mut combined = Vec::with_capacity(self.middleware.len() + middleware.len());
        combined.extend(self.middleware.iter().cloned());
        combined.extend(middleware.iter().cloned());

        let template = [self.prefix.as_str(), template].concat();
        self.app
            .add(method, &template, Arc::new(handler), combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::error::HandlerResult;
    use futures::future::BoxFuture;
    use http::StatusCode;

    fn ok(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move { ctx.code(StatusCode::OK) })
    }

    #[test]
    fn test_group_prefixes_templates() {
        let mut app = App::new();
        let mut api = app.group("/api", &[]);
        api.get("/users/:id", ok, &[]).unwrap();

        let routes = app.router().routes_for(&Method::GET);
        assert_eq!(routes[0].template(), "/api/users/:id");
    }

    #[test]
    fn test_group_middleware_is_prepended() {
        use crate::middleware::{Middleware, Next};
        use async_trait::async_trait;

        struct Tag;

        #[async_trait]
        impl Middleware for Tag {
            async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult {
                next.run(ctx).await
            }
        }

        let shared: Arc<dyn Middleware> = Arc::new(Tag);
        let own: Arc<dyn Middleware> = Arc::new(Tag);

        let mut app = App::new();
        let mut api = app.group("/api", std::slice::from_ref(&shared));
        api.get("/users", ok, std::slice::from_ref(&own)).unwrap();

        let routes = app.router().routes_for(&Method::GET);
        assert_eq!(routes[0].middleware().len(), 2);
        assert!(Arc::ptr_eq(&routes[0].middleware()[0], &shared));
        assert!(Arc::ptr_eq(&routes[0].middleware()[1], &own));
    }
}
