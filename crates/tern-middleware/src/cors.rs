//! CORS (Cross-Origin Resource Sharing) middleware

use async_trait::async_trait;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, InvalidHeaderValue, VARY,
};
use http::{HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};

use tern_http::{HandlerResult, Middleware, Next, RequestContext};

/// Configuration for the CORS middleware.
///
/// Empty lists fall back to the permissive defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to make cross-origin requests
    pub allowed_origins: Vec<String>,
    /// Methods advertised in preflight responses
    pub allowed_methods: Vec<String>,
    /// Request headers advertised in preflight responses
    pub allowed_headers: Vec<String>,
    /// Response headers exposed to the browser
    pub exposed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PATCH", "PUT", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: vec!["*".to_string()],
            exposed_headers: vec!["*".to_string()],
        }
    }
}

/// CORS middleware.
///
/// Non-preflight requests get `Vary: Origin`, the allow-origin header, and
/// the expose-headers set, then continue down the chain. An OPTIONS
/// preflight is answered directly with 204 and the full allow set; the
/// route handler never runs for a preflight.
pub struct Cors {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    expose_headers: HeaderValue,
}

impl Cors {
    /// CORS with the permissive default configuration
    pub fn new() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_methods: HeaderValue::from_static("GET,POST,PATCH,PUT,DELETE,OPTIONS"),
            allow_headers: HeaderValue::from_static("*"),
            expose_headers: HeaderValue::from_static("*"),
        }
    }

    /// CORS with an explicit configuration. Empty config lists fall back
    /// to the defaults.
    ///
    /// # Errors
    ///
    /// Fails when a configured value cannot be encoded as a header value.
    pub fn with_config(config: CorsConfig) -> Result<Self, InvalidHeaderValue> {
        let defaults = CorsConfig::default();
        let pick = |values: Vec<String>, fallback: Vec<String>| {
            if values.is_empty() { fallback } else { values }
        };

        let allow_origin = pick(config.allowed_origins, defaults.allowed_origins).join(",");
        let allow_methods = pick(config.allowed_methods, defaults.allowed_methods).join(",");
        let allow_headers = pick(config.allowed_headers, defaults.allowed_headers).join(",");
        let expose_headers = pick(config.exposed_headers, defaults.exposed_headers).join(",");

        Ok(Self {
            allow_origin: HeaderValue::from_str(&allow_origin)?,
            allow_methods: HeaderValue::from_str(&allow_methods)?,
            allow_headers: HeaderValue::from_str(&allow_headers)?,
            expose_headers: HeaderValue::from_str(&expose_headers)?,
        })
    }
}

impl Default for Cors {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for Cors {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult {
        if ctx.method() != Method::OPTIONS {
            ctx.append_header(VARY, HeaderValue::from_static("Origin"));
            ctx.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
            ctx.set_header(ACCESS_CONTROL_EXPOSE_HEADERS, self.expose_headers.clone());
            return next.run(ctx).await;
        }

        ctx.append_header(VARY, HeaderValue::from_static("Origin"));
        ctx.append_header(
            VARY,
            HeaderValue::from_static("Access-Control-Request-Method"),
        );
        ctx.append_header(
            VARY,
            HeaderValue::from_static("Access-Control-Request-Headers"),
        );
        ctx.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        ctx.set_header(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        ctx.set_header(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());

        ctx.code(StatusCode::NO_CONTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tern_http::Handler;

    struct Flag {
        invoked: AtomicBool,
    }

    #[async_trait]
    impl Handler for Flag {
        async fn call(&self, ctx: &mut RequestContext) -> HandlerResult {
            self.invoked.store(true, Ordering::SeqCst);
            ctx.string(StatusCode::OK, "ok")
        }
    }

    fn context(method: Method) -> RequestContext {
        let (parts, body) = Request::builder()
            .method(method)
            .uri("/resource")
            .body(Bytes::new())
            .unwrap()
            .into_parts();
        RequestContext::new(parts, body)
    }

    #[tokio::test]
    async fn test_simple_request_gets_headers_and_continues() {
        let cors = Cors::new();
        let handler = Flag {
            invoked: AtomicBool::new(false),
        };
        let mut ctx = context(Method::GET);

        cors.handle(&mut ctx, Next::new(&[], &handler)).await.unwrap();
        assert!(handler.invoked.load(Ordering::SeqCst));

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(response.headers().get(VARY).unwrap(), "Origin");
    }

    #[tokio::test]
    async fn test_preflight_is_answered_without_handler() {
        let cors = Cors::new();
        let handler = Flag {
            invoked: AtomicBool::new(false),
        };
        let mut ctx = context(Method::OPTIONS);

        cors.handle(&mut ctx, Next::new(&[], &handler)).await.unwrap();
        assert!(!handler.invoked.load(Ordering::SeqCst));

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET,POST,PATCH,PUT,DELETE,OPTIONS"
        );
        assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_HEADERS));
        assert_eq!(response.headers().get_all(VARY).iter().count(), 3);
    }

    #[tokio::test]
    async fn test_configured_origins_are_joined() {
        let config = CorsConfig {
            allowed_origins: vec![
                "https://one.example".to_string(),
                "https://two.example".to_string(),
            ],
            ..CorsConfig::default()
        };
        let cors = Cors::with_config(config).unwrap();
        let handler = Flag {
            invoked: AtomicBool::new(false),
        };
        let mut ctx = context(Method::GET);

        cors.handle(&mut ctx, Next::new(&[], &handler)).await.unwrap();

        let response = ctx.into_response();
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://one.example,https://two.example"
        );
    }

    #[test]
    fn test_empty_config_lists_fall_back_to_defaults() {
        let cors = Cors::with_config(CorsConfig {
            allowed_origins: Vec::new(),
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            exposed_headers: Vec::new(),
        })
        .unwrap();
        assert_eq!(cors.allow_origin, "*");
    }
}
