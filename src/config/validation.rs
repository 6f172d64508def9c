//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate address shapes and value ranges (timeouts > 0, ports valid)
//! - Produce the immutable `Settings` consumed by the runtime
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: &ProxyConfig → Result<Settings, Vec<ValidationError>>

use std::time::Duration;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::settings::Settings;
use crate::load_balancer::backend::{BackendAddress, BackendSet};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,

    #[error("listen address {0:?} is not host:port")]
    InvalidListenAddr(String),

    #[error("backend #{index} address {addr:?} is not host:port")]
    InvalidBackendAddr { index: usize, addr: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

/// Validate a configuration and build runtime settings from it.
pub fn validate_config(config: &ProxyConfig) -> Result<Settings, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_host_port(&config.listen_addr) {
        errors.push(ValidationError::InvalidListenAddr(config.listen_addr.clone()));
    }

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for (index, addr) in config.backends.iter().enumerate() {
        if !is_host_port(addr) {
            errors.push(ValidationError::InvalidBackendAddr {
                index,
                addr: addr.clone(),
            });
        }
    }

    if config.connection_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "connection_timeout_secs",
        });
    }
    if config.dial_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "dial_timeout_secs",
        });
    }
    if config.drain_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout {
            field: "drain_timeout_secs",
        });
    }

    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.log_level.clone()));
    }

    let backends = BackendSet::new(config.backends.iter().map(BackendAddress::new).collect());

    match backends {
        Some(backends) if errors.is_empty() => Ok(Settings {
            listen_addr: config.listen_addr.clone(),
            backends,
            idle_timeout: Duration::from_secs(config.connection_timeout_secs),
            dial_timeout: Duration::from_secs(config.dial_timeout_secs),
            drain_timeout: config.drain_timeout_secs.map(Duration::from_secs),
            strategy: config.strategy,
        }),
        _ => Err(errors),
    }
}

/// Accepts "host:port" and "[v6]:port" with a numeric port.
fn is_host_port(addr: &str) -> bool {
    let Some((host, port)) = addr.rsplit_once(':') else {
        return false;
    };
    if host.is_empty() || port.parse::<u16>().is_err() {
        return false;
    }
    match host.strip_prefix('[') {
        Some(rest) => rest.ends_with(']') && rest.len() > 1,
        None => !host.contains(':'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let settings = validate_config(&ProxyConfig::default()).unwrap();
        assert_eq!(settings.backends.len(), 3);
        assert_eq!(settings.idle_timeout, Duration::from_secs(60));
        assert_eq!(settings.dial_timeout, Duration::from_secs(5));
        assert_eq!(settings.drain_timeout, None);
    }

    #[test]
    fn collects_every_error() {
        let config = ProxyConfig {
            listen_addr: "no-port".into(),
            backends: Vec::new(),
            connection_timeout_secs: 0,
            dial_timeout_secs: 0,
            drain_timeout_secs: Some(0),
            log_level: "loud".into(),
            ..ProxyConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::NoBackends));
        assert!(errors.contains(&ValidationError::InvalidLogLevel("loud".into())));
    }

    #[test]
    fn rejects_bad_backend() {
        let config = ProxyConfig {
            backends: vec!["127.0.0.1:9101".into(), "127.0.0.1:http".into()],
            ..ProxyConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidBackendAddr {
                index: 1,
                addr: "127.0.0.1:http".into()
            }]
        );
    }

    #[test]
    fn host_port_shapes() {
        assert!(is_host_port("localhost:8080"));
        assert!(is_host_port("0.0.0.0:0"));
        assert!(is_host_port("[::1]:9000"));
        assert!(!is_host_port(":8080"));
        assert!(!is_host_port("::1:9000"));
        assert!(!is_host_port("host:70000"));
        assert!(!is_host_port("[]:80"));
    }
}
