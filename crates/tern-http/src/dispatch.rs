//! Per-request dispatch
//!
//! # State machine
//! ```text
//! request parts + body
//!     → fresh RequestContext
//!     → route lookup (router.rs)
//!     → NotFound: fallback handler → response
//!     → Matched: merge params (path → query → form)
//!         → before+route chain around the handler (middleware.rs)
//!         → on success: deferred "after" middleware
//!         → on failure: log, terminate with 500 if nothing committed
//!     → response
//! ```
//!
//! # Design Decisions
//! - The context is threaded explicitly through every call; there is no
//!   process-wide current-request state, so concurrent dispatches can
//!   never alias each other
//! - Dispatch performs no I/O: the body is already collected and the
//!   response is buffered; the transport layer owns both wire ends
//! - A chain error is the request's terminal outcome: logged once, never
//!   retried, and the response is always terminated without a double write

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use tracing::{debug, error};

use crate::app::App;
use crate::context::RequestContext;
use crate::middleware::{MiddlewareChain, run_deferred};
use crate::params::{is_form_content_type, parse_form_params, parse_query_params};
use crate::router::{RouteMatch, split_target};

impl App {
    /// Dispatch one request through the routing engine and middleware
    /// chain, producing the final response.
    ///
    /// The body must already be collected; [`Server`](crate::Server) does
    /// this before calling in. This method is also the seam for driving
    /// the whole engine in tests without a socket.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Response<Full<Bytes>> {
        let (parts, body) = request.into_parts();
        let method = parts.method.clone();
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let (path, query) = split_target(&target);
        let path = path.to_string();
        let query = query.map(str::to_string);

        let mut ctx = RequestContext::new(parts, body);

        let Some(RouteMatch { route, params }) = self.router.find_route(&method, &path) else {
            debug!(%method, %path, "no route matched");
            if let Err(err) = self.not_found.call(&mut ctx).await {
                error!(error = %err, "not-found handler failed");
                terminate(&mut ctx);
            }
            return ctx.into_response();
        };

        debug!(%method, %path, template = route.template(), "dispatching");

        // Merge order: path, then query, then form; later stages overwrite
        // earlier ones on key collision.
        ctx.add_params(params);
        if let Some(query) = &query {
            ctx.add_params(parse_query_params(query));
        }
        if is_form_content_type(ctx.headers()) {
            let form = parse_form_params(ctx.body());
            ctx.add_params(form);
        }

        let chain = MiddlewareChain::build(&self.before, route.middleware());
        match chain.run(route.handler().as_ref(), &mut ctx).await {
            Ok(()) => {
                if let Err(err) = run_deferred(&self.after, &mut ctx).await {
                    // The response is already committed; nothing to roll
                    // back. The remaining after-middleware is skipped.
                    error!(%method, %path, error = %err, "after middleware failed");
                }
            }
            Err(err) => {
                error!(%method, %path, error = %err, "handler chain failed");
                terminate(&mut ctx);
            }
        }

        ctx.into_response()
    }
}

/// Guarantee the response is terminated after a failure: write a bare 500
/// if nothing was committed. A committed response stands as written; a
/// failure never causes a second write.
fn terminate(ctx: &mut RequestContext) {
    if !ctx.committed() {
        let _ = ctx.code(StatusCode::INTERNAL_SERVER_ERROR);
    }
}
