//! Accept loop and worker registry
//!
//! One worker task per accepted connection, tracked so shutdown can stop
//! accepting, let in-flight requests finish, and wait for every worker
//! before the shared log is torn down.

use std::net::SocketAddr;
use std::sync::Arc;

use linelog_core::{AccessCoordinator, TeardownReport};
use tokio::net::{TcpListener, TcpSocket};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::config::ServerConfig;
use crate::connection::ConnectionWorker;
use crate::error::{ServerError, ServerResult};

/// Summary of a completed server run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerReport {
    /// Connections accepted over the server's lifetime
    pub connections_served: u64,
    /// What tearing down the log released; `None` if the log was still
    /// shared elsewhere when the server stopped
    pub teardown: Option<TeardownReport>,
}

/// TCP front-end for a shared record log
pub struct LinelogServer {
    listener: TcpListener,
    log: Arc<AccessCoordinator>,
    shutdown: CancellationToken,
    workers: TaskTracker,
    recv_buffer_size: usize,
}

impl LinelogServer {
    /// Create the log and start listening
    #[instrument(skip(config), fields(addr = %config.bind_addr))]
    pub async fn bind(config: &ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let log = AccessCoordinator::from_config(&config.coordinator_config())?;
        let listener = listen(config.bind_addr, config.backlog)?;

        info!(
            addr = %listener.local_addr()?,
            store = ?config.store,
            "Listening"
        );

        Ok(Self {
            listener,
            log: Arc::new(log),
            shutdown: CancellationToken::new(),
            workers: TaskTracker::new(),
            recv_buffer_size: config.recv_buffer_size,
        })
    }

    /// The address actually bound (useful with port 0)
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The shared log
    pub fn log(&self) -> Arc<AccessCoordinator> {
        Arc::clone(&self.log)
    }

    /// Accept connections until shutdown, then drain workers and tear down
    pub async fn run(self) -> ServerResult<ServerReport> {
        let mut connections_served = 0u64;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections_served += 1;
                        let worker = ConnectionWorker::new(
                            stream,
                            peer,
                            Arc::clone(&self.log),
                            self.shutdown.child_token(),
                            self.recv_buffer_size,
                        );
                        self.workers
                            .spawn(worker.run().instrument(info_span!("connection", %peer)));
                    }
                    Err(e) => {
                        error!(error = %e, "Error accepting connection");
                    }
                },
            }
        }

        drop(self.listener);
        self.workers.close();
        info!(active = self.workers.len(), "Waiting for connection workers");
        self.workers.wait().await;

        let teardown = match Arc::into_inner(self.log) {
            Some(log) => Some(log.teardown()),
            None => {
                warn!("Log still shared at shutdown; records released on last drop");
                None
            }
        };

        debug!(connections_served, "Server stopped");
        Ok(ServerReport {
            connections_served,
            teardown,
        })
    }
}

fn listen(addr: SocketAddr, backlog: u32) -> ServerResult<TcpListener> {
    let bind_err = |source| ServerError::Bind { addr, source };

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(bind_err)?;
    socket.set_reuseaddr(true).map_err(bind_err)?;
    socket.bind(addr).map_err(bind_err)?;
    socket.listen(backlog).map_err(bind_err)
}

/// Resolves when the process receives SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> ServerConfig {
        ServerConfig::default().with_bind_addr("127.0.0.1:0".parse().unwrap())
    }

    #[tokio::test]
    async fn test_bind_reports_local_addr() {
        let server = LinelogServer::bind(&local_config()).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_bind_error() {
        let first = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let taken = first.local_addr().unwrap();

        let config = ServerConfig::default().with_bind_addr(taken);
        let result = LinelogServer::bind(&config).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_run_stops_when_cancelled() {
        let server = LinelogServer::bind(&local_config()).await.unwrap();
        let shutdown = server.shutdown_token();
        shutdown.cancel();

        let report = server.run().await.unwrap();
        assert_eq!(report.connections_served, 0);
        assert_eq!(report.teardown, Some(TeardownReport::default()));
    }
}
