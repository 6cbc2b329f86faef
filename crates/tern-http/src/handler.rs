//! Handler contract
//!
//! A handler is the terminal callable of a dispatched request: it receives
//! the [`RequestContext`] and is the only mechanism for producing a response
//! body and status. Handlers are registered `Arc`-wrapped and shared across
//! requests.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::RequestContext;
use crate::error::HandlerResult;

/// Terminal request handler.
///
/// Implement this trait directly for stateful handlers, or write a plain
/// function: any `fn(&mut RequestContext) -> BoxFuture<'_, HandlerResult>`
/// is a handler via the blanket impl.
///
/// ```rust,no_run
/// use futures::future::BoxFuture;
/// use http::StatusCode;
/// use tern_http::{HandlerResult, RequestContext};
///
/// fn hello(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
///     Box::pin(async move { ctx.string(StatusCode::OK, "hello") })
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one request. Errors are fatal for the request and propagate
    /// to the dispatch boundary.
    async fn call(&self, ctx: &mut RequestContext) -> HandlerResult;
}

#[async_trait]
impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    async fn call(&self, ctx: &mut RequestContext) -> HandlerResult {
        self(ctx).await
    }
}
