//! # Hello Server Demo
//!
//! A small application showing the full registration surface: plain
//! routes, path parameters, a route group with shared middleware, global
//! before/after middleware, and CORS.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use clap::Parser;
use futures::future::BoxFuture;
use tracing::info;

use tern_http::{
    App, HandlerResult, Middleware, Next, RequestContext, Server, ServerConfig, StatusCode,
};
use tern_middleware::Cors;

#[derive(Parser)]
#[command(about = "tern demo server")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8641)]
    port: u16,
}

/// Logs each request with its handling time
struct RequestLog;

#[async_trait]
impl Middleware for RequestLog {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult {
        let started = Instant::now();
        let method = ctx.method().clone();
        let path = ctx.path().to_string();

        let result = next.run(ctx).await;

        info!(
            %method,
            path,
            status = %ctx.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request handled"
        );
        result
    }
}

fn hello(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { ctx.string(StatusCode::OK, "Hello from tern!") })
}

fn show_user(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let id = ctx.param("id").unwrap_or("unknown").to_string();
        ctx.json(StatusCode::OK, &serde_json::json!({ "user": id }))
    })
}

fn search(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let query = ctx.param("q").unwrap_or("").to_string();
        let any_query = ctx.has_param("param");
        ctx.json(
            StatusCode::OK,
            &serde_json::json!({ "q": query, "query_present": any_query }),
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut app = App::new();
    app.before(Arc::new(RequestLog));

    app.get("/", hello, &[])?;
    app.get("/search", search, &[])?;

    let cors: Arc<dyn Middleware> = Arc::new(Cors::new());
    let mut api = app.group("/api", std::slice::from_ref(&cors));
    api.get("/users/:id", show_user, &[])?;

    let config =
        ServerConfig::default().bind_address(SocketAddr::from(([127, 0, 0, 1], args.port)));
    info!(port = args.port, "starting hello-server");

    Server::new(app, config).run().await?;
    Ok(())
}
