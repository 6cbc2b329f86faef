//! HTTP transport boundary
//!
//! The server owns the wire: it accepts connections, collects each request
//! body up-front (bounded by the configured limit), hands the dispatcher a
//! fully-buffered request, and writes the buffered response back. The
//! routing engine itself never touches a socket.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::app::App;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl ServerConfig {
    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}

/// HTTP/1.1 server dispatching requests through an [`App`].
///
/// Constructing the server consumes the `App`; registration is over once
/// serving can begin, so the route table is read-only for its whole
/// serving lifetime and lookups need no locking.
pub struct Server {
    config: ServerConfig,
    app: Arc<App>,
}

impl Server {
    /// Create a server from a fully-registered application
    pub fn new(app: App, config: ServerConfig) -> Self {
        Self {
            config,
            app: Arc::new(app),
        }
    }

    /// Bind the configured address and serve until the process exits
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_address).await?;
        self.serve(listener).await
    }

    /// Serve connections from an existing listener (useful for binding to
    /// an ephemeral port in tests).
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        info!(address = %addr, "server listening");

        let max_body_size = self.config.max_body_size;

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!(%peer_addr, "new connection");

            let app = Arc::clone(&self.app);
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let app = Arc::clone(&app);
                    async move {
                        Ok::<_, Infallible>(handle_request(req, app, max_body_size).await)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    // Client disconnects are routine, not failures.
                    if err.to_string().contains("connection closed before message completed") {
                        debug!("client disconnected: {}", err);
                    } else {
                        error!("error serving connection: {}", err);
                    }
                }
            });
        }
    }

    /// The server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Collect the body (bounded) and run the dispatcher. Body-read failures
/// are answered here; the engine only ever sees complete requests.
async fn handle_request(
    req: Request<Incoming>,
    app: Arc<App>,
    max_body_size: usize,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let bytes = match Limited::new(body, max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let status = if err.downcast_ref::<LengthLimitError>().is_some() {
                warn!(max_body_size, "request body over limit");
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                warn!(error = %err, "failed to read request body");
                StatusCode::BAD_REQUEST
            };
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = status;
            return response;
        }
    };

    app.dispatch(Request::from_parts(parts, bytes)).await
}
