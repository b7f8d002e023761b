//! Startup configuration.

use std::env;
use std::fmt::{self, Debug};
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo-16k";
pub const DEFAULT_OPENAI_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_OPENAI_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_SERPER_BASE_URL: &str = "https://google.serper.dev";
pub const DEFAULT_ADDR: &str = "0.0.0.0:8501";
pub const DEFAULT_LOG_FILTER: &str = "carecrew=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    Missing(&'static str),
    #[error("environment variable `{name}` has an invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings read once at startup and never written back.
#[derive(Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub openai_max_tokens: u32,
    pub serper_api_key: String,
    pub serper_base_url: String,
    pub addr: SocketAddr,
}

impl AppConfig {
    /// Reads the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        Ok(Self {
            openai_api_key: vars.required("OPENAI_API_KEY")?,
            openai_base_url: vars
                .optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_owned()),
            openai_model: vars
                .optional("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_owned()),
            openai_temperature: vars
                .parsed("OPENAI_TEMPERATURE")?
                .unwrap_or(DEFAULT_OPENAI_TEMPERATURE),
            openai_max_tokens: vars
                .parsed("OPENAI_MAX_TOKENS")?
                .unwrap_or(DEFAULT_OPENAI_MAX_TOKENS),
            serper_api_key: vars.required("SERPER_API_KEY")?,
            serper_base_url: vars
                .optional("SERPER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SERPER_BASE_URL.to_owned()),
            addr: match vars.parsed("CARECREW_ADDR")? {
                Some(addr) => addr,
                None => parse_value("CARECREW_ADDR", DEFAULT_ADDR)?,
            },
        })
    }
}

impl Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("openai_api_key", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("openai_temperature", &self.openai_temperature)
            .field("openai_max_tokens", &self.openai_max_tokens)
            .field("serper_api_key", &"<redacted>")
            .field("serper_base_url", &self.serper_base_url)
            .field("addr", &self.addr)
            .finish()
    }
}

/// Builds the log filter from `RUST_LOG`, falling back to
/// [`DEFAULT_LOG_FILTER`] only when it is unset or blank.
pub fn log_filter(rust_log: Option<&str>) -> Result<EnvFilter, ParseError> {
    match rust_log.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_new(DEFAULT_LOG_FILTER),
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Blank values count as unset.
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(name)
            .map(|value| parse_value(name, &value))
            .transpose()
    }
}

fn parse_value<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|err: T::Err| ConfigError::Invalid {
        name,
        value: value.to_owned(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const KEYS: [(&str, &str); 2] =
        [("OPENAI_API_KEY", "sk-test"), ("SERPER_API_KEY", "serper-test")];

    #[test]
    fn test_defaults() {
        let config = load(&KEYS).unwrap();
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.serper_api_key, "serper-test");
        assert_eq!(config.openai_model, "gpt-3.5-turbo-16k");
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert!((config.openai_temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.openai_max_tokens, 8000);
        assert_eq!(config.serper_base_url, DEFAULT_SERPER_BASE_URL);
        assert_eq!(config.addr.port(), 8501);
    }

    #[test]
    fn test_missing_keys() {
        let err = load(&[("SERPER_API_KEY", "serper-test")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));

        let err = load(&[("OPENAI_API_KEY", "sk-test"), ("SERPER_API_KEY", "  ")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "environment variable `SERPER_API_KEY` is not set"
        );
    }

    #[test]
    fn test_overrides() {
        let mut pairs = KEYS.to_vec();
        pairs.extend([
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_MAX_TOKENS", "1024"),
            ("CARECREW_ADDR", "127.0.0.1:9000"),
        ]);
        let config = load(&pairs).unwrap();
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_max_tokens, 1024);
        assert_eq!(config.addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_number() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("OPENAI_TEMPERATURE", "warm"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "OPENAI_TEMPERATURE", .. }
        ));
    }

    #[test]
    fn test_log_filter() {
        let filter = log_filter(Some("carecrew=debug")).unwrap();
        assert_eq!(filter.to_string(), "carecrew=debug");

        assert_eq!(log_filter(None).unwrap().to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(Some(" ")).unwrap().to_string(), DEFAULT_LOG_FILTER);
        assert!(log_filter(Some("carecrew=loud")).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&KEYS).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-test"));
        assert!(!debug.contains("serper-test"));
        assert!(debug.contains("<redacted>"));
    }
}
