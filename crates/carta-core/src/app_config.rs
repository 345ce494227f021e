use std::fmt;
use std::time::Duration;

/// Deployment the client is talking to. Informational; logged at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Maps `CARTA_ENV` to a variant. Anything unrecognised is development.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        })
    }
}

/// Runtime settings for the storefront client, built by
/// [`crate::load_app_config`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the storefront REST API, e.g. `https://api.carta.test/api`.
    pub api_base_url: String,
    pub env: Environment,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Upper bound on one request, both in reqwest and around each fetch.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Fixed polling interval for resources stuck in the failed state.
    pub retry_interval_ms: u64,
    pub user_agent: String,
}

impl AppConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}
