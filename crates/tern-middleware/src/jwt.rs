//! JSON Web Token middleware
//!
//! Gates a route behind a signed token. The token is read from the
//! aggregated `token` parameter by default (so `?token=<hash>` works out of
//! the box) or from an `Authorization: Bearer` header; a missing or invalid
//! token answers the request directly with the fixed `"JWT Error"` payload
//! and the handler never runs.

use async_trait::async_trait;
use http::StatusCode;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use tern_http::{HandlerResult, Middleware, Next, RequestContext};

/// Where the middleware looks for the token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The aggregated `token` parameter (query string by default)
    Query,
    /// An `Authorization: Bearer <token>` request header
    Header,
}

/// Configuration for the JWT middleware
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC signing secret
    pub secret: Vec<u8>,
    /// Signature algorithm, HS256 by default
    pub algorithm: Algorithm,
    /// Token source, the `token` parameter by default
    pub source: TokenSource,
}

impl JwtConfig {
    /// Default configuration for a secret: HS256, token from the `token`
    /// parameter
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            source: TokenSource::Query,
        }
    }

    /// Change the token source
    pub fn source(mut self, source: TokenSource) -> Self {
        self.source = source;
        self
    }
}

/// JWT validation middleware
pub struct Jwt {
    decoding_key: DecodingKey,
    validation: Validation,
    source: TokenSource,
}

impl Jwt {
    /// Build the middleware from a configuration
    pub fn new(config: JwtConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation: Validation::new(config.algorithm),
            source: config.source,
        }
    }

    fn extract_token(&self, ctx: &RequestContext) -> Option<String> {
        match self.source {
            TokenSource::Query => ctx.param("token").map(str::to_string),
            TokenSource::Header => ctx
                .header("authorization")?
                .strip_prefix("Bearer ")
                .map(str::to_string),
        }
    }
}

#[async_trait]
impl Middleware for Jwt {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult {
        let Some(token) = self.extract_token(ctx) else {
            debug!("jwt token missing");
            return reject(ctx);
        };

        match decode::<serde_json::Value>(&token, &self.decoding_key, &self.validation) {
            Ok(_) => next.run(ctx).await,
            Err(err) => {
                debug!(error = %err, "jwt validation failed");
                reject(ctx)
            }
        }
    }
}

/// Fixed rejection payload for missing/invalid tokens
fn reject(ctx: &mut RequestContext) -> HandlerResult {
    ctx.json(StatusCode::INTERNAL_SERVER_ERROR, &"JWT Error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, Request};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};
    use tern_http::Handler;

    const SECRET: &str = "top-secret";

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: u64,
    }

    fn signed_token(secret: &str) -> String {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600;
        let claims = Claims {
            sub: "tester".to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

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

    fn context_with_token(token: Option<&str>) -> RequestContext {
        let (parts, body) = Request::builder()
            .method(Method::GET)
            .uri("/guarded")
            .body(Bytes::new())
            .unwrap()
            .into_parts();
        let mut ctx = RequestContext::new(parts, body);
        if let Some(token) = token {
            ctx.add_params(HashMap::from([(
                "token".to_string(),
                token.to_string(),
            )]));
        }
        ctx
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let jwt = Jwt::new(JwtConfig::new(SECRET));
        let handler = Flag {
            invoked: AtomicBool::new(false),
        };
        let mut ctx = context_with_token(Some(&signed_token(SECRET)));

        jwt.handle(&mut ctx, Next::new(&[], &handler)).await.unwrap();
        assert!(handler.invoked.load(Ordering::SeqCst));
        assert_eq!(ctx.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let jwt = Jwt::new(JwtConfig::new(SECRET));
        let handler = Flag {
            invoked: AtomicBool::new(false),
        };
        let mut ctx = context_with_token(None);

        jwt.handle(&mut ctx, Next::new(&[], &handler)).await.unwrap();
        assert!(!handler.invoked.load(Ordering::SeqCst));
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_wrong_signature_is_rejected() {
        let jwt = Jwt::new(JwtConfig::new(SECRET));
        let handler = Flag {
            invoked: AtomicBool::new(false),
        };
        let mut ctx = context_with_token(Some(&signed_token("other-secret")));

        jwt.handle(&mut ctx, Next::new(&[], &handler)).await.unwrap();
        assert!(!handler.invoked.load(Ordering::SeqCst));
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bearer_header_source() {
        let jwt = Jwt::new(JwtConfig::new(SECRET).source(TokenSource::Header));
        let handler = Flag {
            invoked: AtomicBool::new(false),
        };

        let (parts, body) = Request::builder()
            .method(Method::GET)
            .uri("/guarded")
            .header("authorization", format!("Bearer {}", signed_token(SECRET)))
            .body(Bytes::new())
            .unwrap()
            .into_parts();
        let mut ctx = RequestContext::new(parts, body);

        jwt.handle(&mut ctx, Next::new(&[], &handler)).await.unwrap();
        assert!(handler.invoked.load(Ordering::SeqCst));
    }
}
