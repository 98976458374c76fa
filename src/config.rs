//! Server configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default listening port, overridable through the PORT environment variable
pub const DEFAULT_PORT: u16 = 6379;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: String,

    /// Listening port
    pub port: u16,

    /// Snapshot file rewritten after each mutation
    pub snapshot_path: PathBuf,

    /// Append-only journal of mutating commands
    pub journal_path: PathBuf,

    /// Interval between eager expiry sweeps
    pub sweep_interval: Duration,

    /// Bound on outbound fetch requests
    pub fetch_timeout: Duration,
}

impl Config {
    /// Configuration with the PORT environment variable applied
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            config.port = port;
        }
        config
    }

    /// Bind address in host:port form
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            snapshot_path: PathBuf::from("emberdb_data.json"),
            journal_path: PathBuf::from("emberdb_journal.log"),
            sweep_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addr() {
        let config = Config::default();
        assert_eq!(config.addr(), "127.0.0.1:6379");
    }
}
