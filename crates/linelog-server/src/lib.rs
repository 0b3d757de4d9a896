//! # Linelog Server
//!
//! TCP front-end for a shared [`linelog_core`] log.
//!
//! Every connection gets its own worker task. Each chunk a client sends is
//! appended to the log, and the full log is sent straight back, with the
//! append and the read-back done atomically with respect to other clients.
//! On shutdown the server stops accepting, lets workers finish the request
//! they are handling, waits for all of them, then tears the log down.
//!
//! ## Example
//!
//! ```rust,ignore
//! use linelog_server::{LinelogServer, ServerConfig, shutdown_signal};
//!
//! let server = LinelogServer::bind(&ServerConfig::default()).await?;
//! let stop = server.shutdown_token();
//! tokio::spawn(async move {
//!     shutdown_signal().await;
//!     stop.cancel();
//! });
//! let report = server.run().await?;
//! ```

pub mod config;
mod connection;
mod error;
pub mod server;

pub use config::{Cli, ServerConfig, StoreConfig};
pub use error::{ServerError, ServerResult};
pub use server::{LinelogServer, ServerReport, shutdown_signal};
