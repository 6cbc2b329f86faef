//! # tern-http
//!
//! A minimal HTTP routing and dispatch framework: declared route templates
//! (`/users/:id`) are compiled to patterns at registration time, incoming
//! requests are matched against them, and the winning handler runs inside
//! an ordered chain of global and route-scoped middleware.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use futures::future::BoxFuture;
//! use http::StatusCode;
//! use tern_http::{App, HandlerResult, RequestContext, Server, ServerConfig};
//!
//! fn show_user(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
//!     Box::pin(async move {
//!         let id = ctx.param("id").unwrap_or("unknown").to_string();
//!         ctx.json(StatusCode::OK, &id)
//!     })
//! }
//!
//! # async fn run() -> std::io::Result<()> {
//! let mut app = App::new();
//! app.get("/users/:id", show_user, &[]).expect("valid template");
//!
//! Server::new(app, ServerConfig::default()).run().await
//! # }
//! ```
//!
//! ## Dispatch model
//!
//! - Routes are registered per method; re-registering a method+template
//!   replaces the previous entry.
//! - Overlapping patterns resolve deterministically: the match with the
//!   most literal segments wins, ties go to the earliest registration.
//! - Handlers see one merged parameter set: path params, then query params
//!   (plus a synthetic `param=1` whenever a query string is present), then
//!   form fields. Later stages overwrite earlier ones.
//! - Middleware composes as: global before (first registered outermost),
//!   then route middleware, then the handler; global after middleware runs
//!   once the response is committed.

pub mod app;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod group;
pub mod handler;
pub mod middleware;
pub mod params;
pub mod pattern;
pub mod router;
pub mod server;

#[cfg(test)]
mod tests;

// Re-export main types
pub use app::App;
pub use context::RequestContext;
pub use error::{HandlerError, HandlerResult, HttpError};
pub use group::Group;
pub use handler::Handler;
pub use middleware::{Middleware, Next};
pub use pattern::{PatternError, RoutePattern};
pub use router::{Route, RouteMatch, Router};
pub use server::{Server, ServerConfig};

// Re-export foundational types handlers are written against
pub use futures::future::BoxFuture;
pub use http::{Method, StatusCode};
