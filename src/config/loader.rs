//! Configuration loading from disk.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<Vec<ValidationError>> for ConfigError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ConfigError::Validation(errors)
    }
}

/// Load configuration from a TOML file, or JSON when the extension is `.json`.
///
/// Only parses; call `validate_config` to obtain runtime `Settings`.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(path, &content)
}

/// Like `load_config`, but a missing file yields `ProxyConfig::default()`.
pub fn load_config_or_default(path: &Path) -> Result<ProxyConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(path, &content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Ok(ProxyConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_config(path: &Path, content: &str) -> Result<ProxyConfig, ConfigError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        serde_json::from_str(content)?
    } else {
        toml::from_str(content)?
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tcp-proxy-{}-{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let path = temp_file(
            "proxy.toml",
            r#"
            listen_addr = "127.0.0.1:9000"
            backends = ["127.0.0.1:9101"]
            connection_timeout_secs = 60
            "#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.backends, vec!["127.0.0.1:9101"]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn loads_json_by_extension() {
        let path = temp_file(
            "proxy.json",
            r#"{"listenAddr": "127.0.0.1:9000", "server": ["127.0.0.1:9101"], "connectionTimeout": 60}"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.backends, vec!["127.0.0.1:9101"]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("tcp-proxy-definitely-missing.toml");
        let config = load_config_or_default(&path).unwrap();
        assert_eq!(config, ProxyConfig::default());
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let path = temp_file("broken.json", "{ not json");
        assert!(matches!(load_config(&path), Err(ConfigError::Json(_))));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn validation_error_display() {
        let err = ConfigError::from(vec![
            ValidationError::NoBackends,
            ValidationError::InvalidLogLevel("loud".into()),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: at least one backend must be configured, unknown log level \"loud\""
        );
    }
}
