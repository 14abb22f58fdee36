use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use evidentia_application::{DEFAULT_MAX_WRITE_ATTEMPTS, WriteRetryPolicy};
use evidentia_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub retry_policy: WriteRetryPolicy,
    pub dev_seed: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = match non_empty(lookup("API_PORT")) {
            Some(value) => value.parse::<u16>().map_err(|error| {
                AppError::validation("API_PORT", format!("invalid port '{value}': {error}"))
            })?,
            None => 3001,
        };

        let max_attempts = match non_empty(lookup("EVIDENTIA_MAX_WRITE_ATTEMPTS")) {
            Some(value) => value.parse::<u8>().map_err(|error| {
                AppError::validation(
                    "EVIDENTIA_MAX_WRITE_ATTEMPTS",
                    format!("invalid attempt count '{value}': {error}"),
                )
            })?,
            None => DEFAULT_MAX_WRITE_ATTEMPTS,
        };
        let retry_policy = WriteRetryPolicy::new(max_attempts).map_err(|error| match error {
            AppError::Validation { reason, .. } => {
                AppError::validation("EVIDENTIA_MAX_WRITE_ATTEMPTS", reason)
            }
            other => other,
        })?;

        let dev_seed = lookup("EVIDENTIA_DEV_SEED")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");

        Ok(Self {
            api_host,
            api_port,
            retry_policy,
            dev_seed,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::validation("API_HOST", format!("invalid host '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
