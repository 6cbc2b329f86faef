//! # tern-middleware
//!
//! Ready-made middleware for the tern HTTP framework:
//!
//! - [`Cors`]: cross-origin resource sharing headers with a configurable
//!   allow/expose set and an OPTIONS preflight short-circuit
//! - [`Jwt`]: JSON Web Token validation gating access to a route
//!
//! Both are ordinary consumers of the [`tern_http::Middleware`] contract:
//! register them globally with `App::before` or per route.

pub mod cors;
pub mod jwt;

pub use cors::{Cors, CorsConfig};
pub use jwt::{Jwt, JwtConfig, TokenSource};
