//! Middleware contract and chain composition
//!
//! Middleware wraps a handler: it receives the request context together with
//! a [`Next`] continuation and decides what to do before and after running
//! the rest of the chain. Pure composition, no registry or side channel.
//!
//! # Execution order
//!
//! For one dispatched request the chain is assembled fresh from:
//!
//! 1. global "before" middleware, in registration order; the first
//!    registered is the outermost wrapper of the whole chain;
//! 2. the matched route's own middleware, in registration order; the first
//!    registered is the outermost of that group;
//! 3. the route handler as the innermost terminal.
//!
//! Global "after" middleware is not part of this chain: it runs once the
//! chain has completed and the response is committed (see
//! [`run_deferred`]), in registration order, with a no-op continuation.
//! An error anywhere stops the remaining chain and is fatal for the
//! request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::HandlerResult;
use crate::handler::Handler;

/// Request/route middleware.
///
/// Registered `Arc`-wrapped so one instance can serve every request.
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use tern_http::{HandlerResult, Middleware, Next, RequestContext};
///
/// struct RequireHeader;
///
/// #[async_trait]
/// impl Middleware for RequireHeader {
///     async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult {
///         if ctx.header("x-api-key").is_none() {
///             return ctx.code(http::StatusCode::UNAUTHORIZED);
///         }
///         next.run(ctx).await
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Run this middleware. Call `next.run(ctx)` to continue the chain;
    /// returning without doing so short-circuits the request.
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult;
}

/// The rest of the chain: the remaining middleware and the terminal
/// handler. Consumed by [`Next::run`]; a middleware that never runs it
/// short-circuits the request.
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Build a continuation over `middleware` ending at `handler`.
    ///
    /// The dispatcher builds these internally; constructing one by hand is
    /// mainly useful for exercising a middleware in isolation in tests.
    pub fn new(middleware: &'a [Arc<dyn Middleware>], handler: &'a dyn Handler) -> Self {
        Self {
            middleware,
            handler,
        }
    }

    /// Run the remainder of the chain to completion.
    pub async fn run(self, ctx: &mut RequestContext) -> HandlerResult {
        match self.middleware.split_first() {
            Some((current, rest)) => {
                let next = Next {
                    middleware: rest,
                    handler: self.handler,
                };
                current.handle(ctx, next).await
            }
            None => self.handler.call(ctx).await,
        }
    }
}

/// The composed before+route chain for one request.
pub(crate) struct MiddlewareChain {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Concatenate global-before and route middleware, preserving each
    /// group's registration order.
    pub(crate) fn build(
        before: &[Arc<dyn Middleware>],
        route: &[Arc<dyn Middleware>],
    ) -> Self {
        let mut middleware = Vec::with_capacity(before.len() + route.len());
        middleware.extend(before.iter().cloned());
        middleware.extend(route.iter().cloned());
        Self { middleware }
    }

    /// Execute the chain around `handler` exactly once.
    pub(crate) async fn run(&self, handler: &dyn Handler, ctx: &mut RequestContext) -> HandlerResult {
        Next::new(&self.middleware, handler).run(ctx).await
    }
}

struct NoopHandler;

#[async_trait]
impl Handler for NoopHandler {
    async fn call(&self, _ctx: &mut RequestContext) -> HandlerResult {
        Ok(())
    }
}

/// Run the global "after" middleware once the main chain has completed and
/// the response is committed. The list is composed like a chain (first
/// registered outermost) around a no-op terminal, so every after-middleware
/// genuinely observes the finished response.
pub(crate) async fn run_deferred(
    after: &[Arc<dyn Middleware>],
    ctx: &mut RequestContext,
) -> HandlerResult {
    Next::new(after, &NoopHandler).run(ctx).await
}
