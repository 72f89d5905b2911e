use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use client_core::DEFAULT_EXEMPT_PATHS;

#[derive(Parser, Debug, Clone)]
#[command(about = "Conference agenda web front end")]
pub struct Args {
    #[arg(long, env = "FRONTEND_BIND", default_value = "127.0.0.1:5001")]
    pub bind: String,
    /// Base URL of the conference REST API.
    #[arg(long, env = "CONFERENCE_API_URL", default_value = "http://127.0.0.1:5000/")]
    pub api_url: String,
    /// HS256 key used to sign identity cookies.
    #[arg(long, env = "IDENTITY_SECRET", hide_env_values = true)]
    pub identity_secret: String,
    #[arg(long, env = "IDENTITY_TTL_SECONDS", default_value_t = 8 * 60 * 60)]
    pub identity_ttl_seconds: i64,
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value_t = 10)]
    pub request_timeout_seconds: u64,
    /// Paths an authenticated but unregistered caller may still reach.
    #[arg(
        long = "exempt-path",
        env = "GATE_EXEMPT_PATHS",
        value_delimiter = ',',
        default_values = DEFAULT_EXEMPT_PATHS
    )]
    pub exempt_paths: Vec<String>,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if self.identity_secret.trim().is_empty() {
            bail!("identity secret must not be empty");
        }
        if self.identity_ttl_seconds <= 0 {
            bail!("identity ttl must be positive");
        }
        if self.request_timeout_seconds == 0 {
            bail!("request timeout must be positive");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
