use std::env;

use fiscalia_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
pub struct ProfilesConfig {
    pub api_base_url: String,
    pub access_token: String,
    pub operator: String,
    pub http_timeout_secs: u64,
    pub read_attempts: u8,
    pub retry_backoff_ms: u64,
}

impl ProfilesConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("FISCALIA_API_BASE_URL")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "http://127.0.0.1:8000".to_owned());
        let parsed = Url::parse(&api_base_url).map_err(|error| {
            AppError::Validation(format!(
                "invalid FISCALIA_API_BASE_URL '{api_base_url}': {error}"
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "FISCALIA_API_BASE_URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let access_token = lookup("FISCALIA_ACCESS_TOKEN")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Validation("FISCALIA_ACCESS_TOKEN is required".to_owned()))?;
        let operator = lookup("FISCALIA_OPERATOR")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "operator".to_owned());

        let http_timeout_secs = parse_number(&lookup, "FISCALIA_HTTP_TIMEOUT_SECS", 15_u64)?;
        let read_attempts = parse_number(&lookup, "FISCALIA_READ_ATTEMPTS", 3_u8)?;
        let retry_backoff_ms = parse_number(&lookup, "FISCALIA_RETRY_BACKOFF_MS", 200_u64)?;

        if http_timeout_secs == 0 {
            return Err(AppError::Validation(
                "FISCALIA_HTTP_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        if read_attempts == 0 {
            return Err(AppError::Validation(
                "FISCALIA_READ_ATTEMPTS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_owned(),
            access_token,
            operator,
            http_timeout_secs,
            read_attempts,
            retry_backoff_ms,
        })
    }
}

fn parse_number<F, T>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
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
