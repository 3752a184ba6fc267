//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server
//! 1. stops `listener.accept()`, so no new connections are made,
//! 2. lets every in-flight connection task run to completion,
//! 3. returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! Each connection runs on its own tokio task. A client that disconnects
//! mid-request drops the connection future, and with it the pipeline that was
//! serving it; that is an ordinary early exit, never an error response.
//!
//! Request bodies are buffered up to [`Server::max_body_bytes`]; anything
//! longer is answered with `payload_too_large` before routing.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::jsonapi::ApiError;
use crate::method::Method;
use crate::request::Request;
use crate::response::IntoResponse;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    max_body_bytes: usize,
}

/// Default request body limit, 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, max_body_bytes: DEFAULT_MAX_BODY_BYTES }
    }

    /// Caps how many body bytes one request may send.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener, router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but on an already-bound listener and
    /// with a caller-supplied shutdown future.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        router: Router,
        shutdown: impl std::future::Future<Output = ()>,
    ) -> Result<(), Error> {
        let local = listener.local_addr()?;
        let router = Arc::new(router);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        info!(addr = %local, max_body_bytes = self.max_body_bytes, "steep listening");

        loop {
            tokio::select! {
                // Shutdown wins over queued connections.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = connections.len(), "shutting down, draining connections");
                    break;
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        spawn_connection(&mut connections, stream, peer, &router, self.max_body_bytes);
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },

                // Finished connections are reaped as they complete.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        while connections.join_next().await.is_some() {}

        info!("steep stopped");
        Ok(())
    }
}

/// Serves one TCP connection, HTTP/1.1 or HTTP/2, on its own task.
fn spawn_connection(
    connections: &mut JoinSet<()>,
    stream: TcpStream,
    peer: SocketAddr,
    router: &Arc<Router>,
    max_body_bytes: usize,
) {
    let router = Arc::clone(router);
    connections.spawn(async move {
        let service = service_fn(move |req| handle(Arc::clone(&router), req, peer, max_body_bytes));
        let served = ConnBuilder::new(TokioExecutor::new())
            .serve_connection(TokioIo::new(stream), service)
            .await;
        if let Err(e) = served {
            debug!(%peer, error = %e, "connection closed with error");
        }
    });
}

// ── Request adaptation ────────────────────────────────────────────────────────

/// Buffers the body, adapts the request, and hands it to the router.
///
/// Every answer is an envelope. The only error handed back to hyper is a
/// body that stopped arriving, which drops the connection unanswered.
async fn handle(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
    max_body_bytes: usize,
) -> Result<http::Response<Full<Bytes>>, BoxError> {
    let (parts, body) = req.into_parts();

    let Ok(method) = Method::try_from(&parts.method) else {
        debug!(%peer, method = %parts.method, "unsupported method");
        return Ok(ApiError::METHOD_NOT_ALLOWED.into_response().into_inner());
    };

    let body = match Limited::new(body, max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            debug!(%peer, limit = max_body_bytes, "request body too large");
            return Ok(ApiError::PAYLOAD_TOO_LARGE.into_response().into_inner());
        }
        Err(e) => {
            debug!(%peer, error = %e, "request body aborted");
            return Err(e);
        }
    };

    let request = Request::new(method, parts.uri, parts.headers, body);
    Ok(router.dispatch(request).await.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On non-Unix platforms
/// only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
