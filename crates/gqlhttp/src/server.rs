//! Built-in HTTP server.
//!
//! Routes:
//! - `<path>` - the GraphQL handler (GET and POST, playground if enabled)
//! - `GET /health` - health check

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::ServerError;
use crate::handler::Handler;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Path of the GraphQL endpoint.
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self {
            port: 4000,
            host: "localhost".to_string(),
            path: "/graphql".to_string(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the endpoint path. A missing leading `/` is added.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Returns `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub(crate) fn health_response() -> &'static str {
    r#"{"status":"healthy"}"#
}

fn json(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

async fn route(handler: Handler, path: String, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let is_health = req.method() == Method::GET && req.uri().path() == "/health";
    let is_endpoint = req.uri().path() == path;

    if is_endpoint {
        handler.handle(req).await.map(Full::new)
    } else if is_health {
        json(StatusCode::OK, health_response())
    } else {
        json(StatusCode::NOT_FOUND, r#"{"error":"Not Found"}"#)
    }
}

/// Binds a listener to the configured address.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.addr();
    TcpListener::bind(addr.as_str())
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serves connections from `listener` until accepting fails.
pub async fn serve(listener: TcpListener, handler: Handler, path: &str) -> Result<(), ServerError> {
    serve_with_shutdown(listener, handler, path, std::future::pending()).await
}

/// Serves connections from `listener` until `shutdown` completes.
///
/// Connections already accepted keep running on their own tasks.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    handler: Handler,
    path: &str,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let (stream, remote) = tokio::select! {
            accepted = listener.accept() => accepted.map_err(ServerError::Accept)?,
            () = &mut shutdown => {
                info!("Shutting down");
                return Ok(());
            }
        };
        debug!(%remote, "accepted connection");

        let io = TokioIo::new(stream);
        let handler = handler.clone();
        let path = path.to_string();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let handler = handler.clone();
                let path = path.clone();
                async move { Ok::<_, Infallible>(route(handler, path, req).await) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                if !err.is_incomplete_message() {
                    error!("Connection error: {:?}", err);
                }
            }
        });
    }
}

/// Binds the configured address and serves `handler` on it until `shutdown` completes.
pub async fn run<F>(config: &ServerConfig, handler: Handler, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    let listener = bind(config).await?;
    let local: Option<SocketAddr> = listener.local_addr().ok();
    let shown = local.map_or_else(|| config.addr(), |addr| addr.to_string());

    info!("Listening on http://{}{}", shown, config.path);
    if handler.options().playground {
        info!("Playground: http://{}{}", shown, config.path);
    }

    serve_with_shutdown(listener, handler, &config.path, shutdown).await
}
