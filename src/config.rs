use std::time::Duration;

use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONCURRENCY: usize = 8;

/// Runtime settings, read from `MF2_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound on a single author-page fetch, connect to last byte.
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    /// Entries resolved in parallel during a batch pass.
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            fetch_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("mf2-authorship/{}", env!("CARGO_PKG_VERSION")),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("MF2").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}
