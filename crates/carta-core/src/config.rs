//! `CARTA_*` environment variables → [`AppConfig`].

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RETRY_INTERVAL_MS: u64 = 3000;
const DEFAULT_USER_AGENT: &str = "carta/0.1 (storefront)";

/// Reads `.env` (if present), then the process environment.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] when `CARTA_API_BASE_URL` is unset
/// and [`ConfigError::InvalidEnvVar`] for any value that does not validate.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Same as [`load_app_config`] without touching `.env`.
///
/// # Errors
///
/// See [`load_app_config`].
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|name| std::env::var(name))
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let env = EnvReader { lookup };

    Ok(AppConfig {
        api_base_url: env.http_url("CARTA_API_BASE_URL")?,
        env: env
            .optional("CARTA_ENV")
            .map_or(Environment::Development, |name| Environment::from_name(&name)),
        log_level: env
            .optional("CARTA_LOG_LEVEL")
            .unwrap_or_else(|| "info".to_owned()),
        request_timeout_secs: env
            .positive("CARTA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
        connect_timeout_secs: env
            .positive("CARTA_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        retry_interval_ms: env.positive("CARTA_RETRY_INTERVAL_MS", DEFAULT_RETRY_INTERVAL_MS)?,
        user_agent: env
            .optional("CARTA_USER_AGENT")
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
    })
}

/// Typed access over an env-var lookup. Blank values count as unset.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    fn optional(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn http_url(&self, var: &str) -> Result<String, ConfigError> {
        let url = self
            .optional(var)
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_owned()))?;
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(url)
        } else {
            Err(invalid(var, format!("expected an http(s) URL, got '{url}'")))
        }
    }

    fn positive(&self, var: &str, default: u64) -> Result<u64, ConfigError> {
        let Some(raw) = self.optional(var) else {
            return Ok(default);
        };
        match raw.parse::<u64>() {
            Ok(0) => Err(invalid(var, "must be greater than zero".to_owned())),
            Ok(value) => Ok(value),
            Err(e) => Err(invalid(var, e.to_string())),
        }
    }
}

fn invalid(var: &str, reason: String) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_owned(),
        reason,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
