//! End-to-end transport tests: a real listener, a real client.

use futures::future::BoxFuture;
use http::StatusCode;
use tokio::net::TcpListener;

use crate::context::RequestContext;
use crate::error::HandlerResult;
use crate::{App, Server, ServerConfig};

fn hello(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { ctx.string(StatusCode::OK, "hello") })
}

fn echo_name(ctx: &mut RequestContext) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        let name = ctx.param("name").unwrap_or("nobody").to_string();
        ctx.string(StatusCode::OK, &name)
    })
}

async fn spawn_server(app: App, config: ServerConfig) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(app, config);
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    addr
}

#[tokio::test]
async fn test_get_over_socket() {
    let mut app = App::new();
    app.get("/hello", hello, &[]).unwrap();
    let addr = spawn_server(app, ServerConfig::default()).await;

    let response = reqwest::get(format!("http://{addr}/hello")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "hello");
}

#[tokio::test]
async fn test_unmatched_route_over_socket() {
    let addr = spawn_server(App::new(), ServerConfig::default()).await;

    let response = reqwest::get(format!("http://{addr}/missing")).await.unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "\"Not Found\"");
}

#[tokio::test]
async fn test_form_post_over_socket() {
    let mut app = App::new();
    app.post("/register", echo_name, &[]).unwrap();
    let addr = spawn_server(app, ServerConfig::default()).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/register"))
        .form(&[("name", "tern")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "tern");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut app = App::new();
    app.post("/upload", hello, &[]).unwrap();
    let addr = spawn_server(app, ServerConfig::default().max_body_size(16)).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/upload"))
        .body("x".repeat(64))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 413);
}
