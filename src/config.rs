//! Command line and environment configuration for the server.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::{Parser, ValueEnum};

/// Where transactions and capital are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// A SQLite database file.
    Sqlite,
    /// Process memory. Everything is lost when the server stops.
    Memory,
}

/// The REST API server for the capital ledger.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Where to keep transactions and capital.
    #[arg(long, env = "LEDGER_STORAGE", value_enum, default_value_t = StorageBackend::Sqlite)]
    pub storage: StorageBackend,

    /// File path to the application SQLite database.
    #[arg(long, env = "LEDGER_DB_PATH", default_value = "ledger.db")]
    pub db_path: PathBuf,

    /// The IP address to listen on.
    #[arg(long, env = "LEDGER_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub address: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "LEDGER_PORT", default_value_t = 3000)]
    pub port: u16,

    /// How many transactions to list when the request gives no valid limit.
    #[arg(long, env = "LEDGER_LIST_LIMIT", default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    pub list_limit: u32,

    /// Recompute capital from the ledger before serving requests.
    #[arg(long, env = "LEDGER_RECONCILE_ON_STARTUP")]
    pub reconcile_on_startup: bool,

    /// Recompute capital from the ledger every N seconds, 0 disables it.
    #[arg(long, env = "LEDGER_RECONCILE_INTERVAL_SECS", default_value_t = 0)]
    pub reconcile_interval_secs: u64,

    /// Also write debug logs to this file.
    #[arg(long, env = "LEDGER_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// The address the server binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// The period of the reconciliation job, `None` if it is disabled.
    pub fn reconcile_interval(&self) -> Option<Duration> {
        (self.reconcile_interval_secs > 0).then(|| Duration::from_secs(self.reconcile_interval_secs))
    }
}
