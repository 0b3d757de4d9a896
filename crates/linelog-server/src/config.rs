//! Configuration for the linelog server

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use linelog_core::{CoordinatorConfig, DEFAULT_CAPACITY, Retention};
use linelog_logging::LogConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Default TCP port
pub const DEFAULT_PORT: u16 = 9000;

/// Default listen backlog
pub const DEFAULT_BACKLOG: u32 = 10;

/// Default size of the per-connection receive buffer
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1024;

/// How the server retains records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Keep the newest `capacity` records
    Ring {
        /// Number of records retained
        capacity: usize,
    },
    /// Keep every record for the life of the process
    Unbounded,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Ring {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<StoreConfig> for Retention {
    fn from(store: StoreConfig) -> Self {
        match store {
            StoreConfig::Ring { capacity } => Retention::Bounded(capacity),
            StoreConfig::Unbounded => Retention::Unbounded,
        }
    }
}

/// Configuration for a linelog server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// Listen backlog
    pub backlog: u32,
    /// Bytes read from a client per receive
    pub recv_buffer_size: usize,
    /// Record retention
    pub store: StoreConfig,
    /// Largest record a client may build up
    pub max_record_size: Option<usize>,
    /// Logging configuration
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            backlog: DEFAULT_BACKLOG,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            store: StoreConfig::default(),
            max_record_size: None,
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Set the listen address
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the record retention
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Set the receive buffer size
    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Set the logging configuration
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> ServerResult<()> {
        if self.recv_buffer_size == 0 {
            return Err(ServerError::config("recv_buffer_size must be at least 1"));
        }
        if let StoreConfig::Ring { capacity: 0 } = self.store {
            return Err(ServerError::config("ring capacity must be at least 1"));
        }
        Ok(())
    }

    /// Settings for the shared record log
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let config = CoordinatorConfig::default().with_retention(self.store.into());
        match self.max_record_size {
            Some(limit) => config.with_max_record_size(limit),
            None => config,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "linelog-server",
    about = "Append client data to a shared line log and echo the log back"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Number of records retained (overrides the config file)
    #[arg(long, conflicts_with = "unbounded")]
    pub capacity: Option<usize>,

    /// Keep every record instead of a bounded ring
    #[arg(long)]
    pub unbounded: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Human-readable console logs instead of JSONL
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    /// Build the effective configuration: file (or defaults), then flags
    pub fn into_config(self) -> ServerResult<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };

        if let Some(addr) = self.bind {
            config.bind_addr = addr;
        }
        if let Some(capacity) = self.capacity {
            config.store = StoreConfig::Ring { capacity };
        }
        if self.unbounded {
            config.store = StoreConfig::Unbounded;
        }
        if let Some(level) = self.log_level {
            config.log.default_level = level;
        }
        if self.pretty {
            config.log.console.pretty = true;
            config.log.console.ansi = true;
        }

        config.validate()?;
        Ok(config)
    }
}
