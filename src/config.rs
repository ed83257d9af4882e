//! Command-line configuration

use crate::api::DEFAULT_API_URL;
use crate::pages::PAGE_POLL_INTERVAL;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "cclog-dash")]
#[command(version, about = "Terminal dashboard for Claude Code usage logs")]
pub struct Config {
    /// Base URL of the log-analysis API
    #[arg(long, env = "CCLOG_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Seconds between page refreshes
    #[arg(long, env = "CCLOG_POLL_SECS", default_value_t = PAGE_POLL_INTERVAL.as_secs(),
          value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_secs: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "CCLOG_TIMEOUT_SECS", default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Write logs to this file (filter via RUST_LOG)
    #[arg(long, env = "CCLOG_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
