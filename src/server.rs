//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. stops calling `listener.accept()`, so no new connections are made;
//! 2. lets every in-flight connection task run to completion, an upload in
//!    the middle of extraction included;
//! 3. returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! Under an orchestrator that sends SIGTERM and later SIGKILL, give the
//! grace period enough room for the slowest upload to finish.
//!
//! # Request bodies
//!
//! Bodies are buffered, up to [`Server::max_body`], before a handler runs.
//! The route's head check (see [`middleware::bearer`](crate::middleware::bearer))
//! runs first, so an upload with the wrong token is refused without reading
//! its body.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{ALLOW, HeaderValue};
use http::StatusCode;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Lookup, Router};

/// Default request-body cap: 256 MiB.
pub const DEFAULT_MAX_BODY: usize = 256 * 1024 * 1024;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    max_body: usize,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, max_body: DEFAULT_MAX_BODY }
    }

    /// Largest request body accepted; bigger ones get `413`.
    pub fn max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }

    /// Serves until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves until `shutdown` resolves, then drains in-flight connections.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared by every connection task without copying the route table.
        let router = Arc::new(router);
        let max_body = self.max_body;

        info!(addr = %listener.local_addr()?, "sitedrop listening");

        // Every connection task, so shutdown can wait for all of them.
        let mut tasks = tokio::task::JoinSet::new();

        // Polled repeatedly from the loop below; it must not move after the
        // first poll.
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting even while
                // connections are still queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    // Adapts tokio's AsyncRead/AsyncWrite to hyper's IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on this connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(&router, req, remote_addr, max_body).await }
                        });

                        // HTTP/1.1 or HTTP/2, whichever the client speaks.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            debug!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the set does not grow
                // for the lifetime of the server.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection before returning.
        while tasks.join_next().await.is_some() {}

        info!("sitedrop stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response.
///
/// Order matters: route lookup, then the handler's head check, then the
/// body. A request refused by the first two never has its body read. Every
/// failure becomes a status code; hyper never sees an error.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
    max_body: usize,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();

    let response = match router.lookup(&method, &path) {
        Lookup::Found(handler) => match handler.admit(&parts) {
            Some(refused) => refused,
            None => match collect_body(body, max_body).await {
                Ok(body) => {
                    let req = Request::new(parts, body, Some(remote_addr));
                    handler.respond(req).await
                }
                Err(status) => {
                    warn!(%method, path = %path, peer = %remote_addr, %status, "request body rejected");
                    Response::builder().status(status).text(status.canonical_reason().unwrap_or_default())
                }
            },
        },
        Lookup::MethodNotAllowed(allow) => {
            let mut res = Response::builder().status(StatusCode::METHOD_NOT_ALLOWED);
            if let Ok(value) = HeaderValue::from_str(&allow) {
                res = res.header(ALLOW, value);
            }
            res.text(format!("Only {allow} allowed"))
        }
        Lookup::NotFound => Response::status(StatusCode::NOT_FOUND),
    };

    debug!(
        %method,
        path = %path,
        status = response.status_code().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    Ok(response.into_inner())
}

async fn collect_body(body: Incoming, max_body: usize) -> Result<Bytes, StatusCode> {
    match Limited::new(body, max_body).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() => {
            Err(StatusCode::PAYLOAD_TOO_LARGE)
        }
        Err(_) => Err(StatusCode::BAD_REQUEST),
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM (Unix) or Ctrl-C. If a handler cannot be installed
/// that arm never fires, and the other still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
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
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
