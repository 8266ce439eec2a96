//! HTTP server startup logic.

use std::net::{Ipv4Addr, SocketAddr, TcpListener};

use axum::Router;
use axum_server::Handle;
use hyper_util::rt::TokioTimer;

use crate::config::{HEADER_READ_TIMEOUT, SHUTDOWN_GRACE_PERIOD};

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serve on {addr}: {source}")]
    Serve {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Binds the listening socket.
///
/// An unspecified IPv6 address accepts IPv4 clients too on dual-stack hosts.
/// Hosts with IPv6 disabled reject it, so the bind is retried on `0.0.0.0`.
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let listener = match TcpListener::bind(addr) {
        Ok(listener) => listener,
        Err(e) if addr.ip().is_unspecified() && addr.is_ipv6() => {
            let fallback = SocketAddr::from((Ipv4Addr::UNSPECIFIED, addr.port()));
            tracing::warn!(%addr, %fallback, error = %e, "IPv6 unavailable, listening on IPv4 only");
            TcpListener::bind(fallback).map_err(|source| ServerError::Bind {
                addr: fallback,
                source,
            })?
        }
        Err(source) => return Err(ServerError::Bind { addr, source }),
    };

    // Tokio requires non-blocking std sockets
    listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::Bind { addr, source })?;
    Ok(listener)
}

/// Start the HTTP server on `addr`.
///
/// Blocks until the server shuts down or the listener fails. Handlers can
/// extract `ConnectInfo<SocketAddr>` for the peer address.
pub async fn start_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = bind_listener(addr)?;
    let addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { addr, source })?;

    let handle = Handle::new();

    // Setup graceful shutdown
    shutdown::setup_shutdown_handler(handle.clone(), SHUTDOWN_GRACE_PERIOD);

    let mut server = axum_server::from_tcp(listener).handle(handle);
    // The header-read timeout is only enforced when the builder has a timer
    server
        .http_builder()
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(HEADER_READ_TIMEOUT);

    tracing::info!(
        %addr,
        header_read_timeout_secs = HEADER_READ_TIMEOUT.as_secs(),
        "Starting HTTP server"
    );

    server
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|source| ServerError::Serve { addr, source })
}
