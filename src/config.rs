//! TOML configuration loading for the connection and logging settings.
//!
//! Mirrors the Raw-struct-with-`Option`-fields idiom: every field is
//! optional at the TOML layer, with defaults (or a [`ConfigError`]) applied
//! once during validation, so a config file only has to state what it
//! wants to override.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub reconnect_delay_ms: u64,
    pub logging: LoggingConfig,
}

/// Logging configuration. At least one of `log_to_file`/`log_to_console`
/// must be set, or loading fails — a logger with nowhere to write is a
/// configuration error, not a silently inert one.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String,
    pub log_to_file: bool,
    pub log_to_console: bool,
    pub log_file_path: Option<String>,
    /// Passed through to whatever `log`-backed formatter the binary
    /// installs (e.g. `env_logger`'s format builder); `StdLogger` itself
    /// only ever prefixes the transaction id, it doesn't interpret this.
    pub format: String,
    pub date_format: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    feed_url: Option<String>,
    reconnect_delay_ms: Option<u64>,
    logging: Option<RawLoggingConfig>,
}

#[derive(Debug, Deserialize)]
struct RawLoggingConfig {
    enabled: Option<bool>,
    level: Option<String>,
    log_to_file: Option<bool>,
    log_to_console: Option<bool>,
    log_file_path: Option<String>,
    format: Option<String>,
    date_format: Option<String>,
}

const DEFAULT_FORMAT: &str = "%(asctime)s - [ %(transaction_id)s ] - %(name)s - %(levelname)s - %(message)s";
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An error loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error(
        "logging is enabled but neither log_to_file nor log_to_console is set; \
         at least one must be true"
    )]
    NoLoggingDestination,
}

/// Loads configuration from a TOML file at `path`.
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    let toml_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_from_str(&toml_str)
}

/// Loads configuration from a TOML string, applying defaults and
/// validating the result.
pub fn load_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(toml_str)?;

    let feed_url = raw
        .feed_url
        .ok_or_else(|| ConfigError::MissingField("feed_url".to_owned()))?;
    let reconnect_delay_ms = raw.reconnect_delay_ms.unwrap_or(5_000);

    let logging = match raw.logging {
        Some(l) => {
            let enabled = l.enabled.unwrap_or(true);
            let log_to_file = l.log_to_file.unwrap_or(false);
            let log_to_console = l.log_to_console.unwrap_or(true);
            if enabled && !log_to_file && !log_to_console {
                return Err(ConfigError::NoLoggingDestination);
            }
            LoggingConfig {
                enabled,
                level: l.level.unwrap_or_else(|| "INFO".to_owned()),
                log_to_file,
                log_to_console,
                log_file_path: l.log_file_path,
                format: l.format.unwrap_or_else(|| DEFAULT_FORMAT.to_owned()),
                date_format: l.date_format.unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_owned()),
            }
        }
        None => LoggingConfig {
            enabled: true,
            level: "INFO".to_owned(),
            log_to_file: false,
            log_to_console: true,
            log_file_path: None,
            format: DEFAULT_FORMAT.to_owned(),
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
        },
    };

    Ok(Config {
        feed_url,
        reconnect_delay_ms,
        logging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_applies_defaults() {
        let config = load_from_str(r#"feed_url = "wss://example.test/feed""#).unwrap();
        assert_eq!(config.feed_url, "wss://example.test/feed");
        assert_eq!(config.reconnect_delay_ms, 5_000);
        assert_eq!(config.logging.level, "INFO");
        assert!(config.logging.log_to_console);
        assert!(!config.logging.log_to_file);
    }

    #[test]
    fn missing_feed_url_is_an_error() {
        let err = load_from_str("reconnect_delay_ms = 1000").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "feed_url"));
    }

    #[test]
    fn enabled_logging_with_no_destination_is_rejected() {
        let toml_str = r#"
            feed_url = "wss://example.test/feed"

            [logging]
            enabled = true
            log_to_file = false
            log_to_console = false
        "#;
        let err = load_from_str(toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::NoLoggingDestination));
    }

    #[test]
    fn disabled_logging_permits_no_destination() {
        let toml_str = r#"
            feed_url = "wss://example.test/feed"

            [logging]
            enabled = false
        "#;
        let config = load_from_str(toml_str).unwrap();
        assert!(!config.logging.enabled);
    }

    #[test]
    fn explicit_file_logging_carries_the_path_through() {
        let toml_str = r#"
            feed_url = "wss://example.test/feed"

            [logging]
            log_to_file = true
            log_to_console = false
            log_file_path = "/var/log/rmonitor-live.log"
        "#;
        let config = load_from_str(toml_str).unwrap();
        assert_eq!(
            config.logging.log_file_path.as_deref(),
            Some("/var/log/rmonitor-live.log")
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = load_from_str("this is not valid toml =====").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
