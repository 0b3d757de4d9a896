//! Per-connection worker
//!
//! Each received chunk is appended to the shared log and the whole log is
//! sent back, with the append and the read-back done under one lock hold.

use std::net::SocketAddr;
use std::sync::Arc;

use linelog_core::AccessCoordinator;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ServerResult;

/// Serves one client until it disconnects or shutdown is requested
pub(crate) struct ConnectionWorker {
    stream: TcpStream,
    peer: SocketAddr,
    log: Arc<AccessCoordinator>,
    shutdown: CancellationToken,
    recv_buffer_size: usize,
}

impl ConnectionWorker {
    pub(crate) fn new(
        stream: TcpStream,
        peer: SocketAddr,
        log: Arc<AccessCoordinator>,
        shutdown: CancellationToken,
        recv_buffer_size: usize,
    ) -> Self {
        Self {
            stream,
            peer,
            log,
            shutdown,
            recv_buffer_size,
        }
    }

    /// Run the worker to completion, logging how the connection ended
    pub(crate) async fn run(mut self) {
        info!("Accepted connection from {}", self.peer.ip());

        if let Err(e) = self.serve().await {
            warn!(peer = %self.peer, error = %e, "Connection ended with error");
        }

        info!("Closed connection from {}", self.peer.ip());
    }

    async fn serve(&mut self) -> ServerResult<()> {
        let mut buf = vec![0u8; self.recv_buffer_size];
        // A request that has been received always runs to completion.
        let in_flight = CancellationToken::new();

        loop {
            // Shutdown is only observed between requests, never mid-reply.
            let received = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("Shutdown requested, closing connection");
                    break;
                }
                read = self.stream.read(&mut buf) => read?,
            };
            if received == 0 {
                break;
            }

            let (outcome, snapshot) = self
                .log
                .append_and_snapshot(&buf[..received], &in_flight)
                .await?;

            debug!(
                received,
                committed = outcome.records_committed,
                reply_len = snapshot.len(),
                "Handled chunk"
            );

            if !snapshot.is_empty() {
                self.stream.write_all(&snapshot).await?;
            }
        }

        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "Socket already closed by peer");
        }
        Ok(())
    }
}
