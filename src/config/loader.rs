//! Configuration loading from disk and environment.

use std::path::Path;
use std::fs;
use crate::config::schema::{GatewayConfig, Secret};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables the process refuses to start without.
pub const REQUIRED_ENV: [&str; 5] = [
    "CONSUL_ADDRESS",
    "JAEGER_ADDRESS",
    "NAVER_CLIENT_ID",
    "NAVER_CLIENT_SECRET",
    "CONSUL_INDEX_HEADER",
];

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    MissingEnv(Vec<&'static str>),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::MissingEnv(names) => {
                write!(f, "please set {} in environment variable", names.join(", "))
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file into a configuration, without environment or validation.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay the required environment variables onto `config`.
///
/// Every variable in [`REQUIRED_ENV`] must be present and non-empty; all
/// missing names are reported together.
pub fn apply_env<F>(config: &mut GatewayConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();
    let mut lookup = |name: &'static str| match env(name).filter(|v| !v.is_empty()) {
        Some(value) => Some(value),
        None => {
            missing.push(name);
            None
        }
    };

    if let Some(v) = lookup("CONSUL_ADDRESS") { config.discovery.address = v; }
    if let Some(v) = lookup("JAEGER_ADDRESS") { config.tracing.collector_address = v; }
    if let Some(v) = lookup("NAVER_CLIENT_ID") { config.open_api.client_id = v; }
    if let Some(v) = lookup("NAVER_CLIENT_SECRET") { config.open_api.client_secret = Secret::new(v); }
    if let Some(v) = lookup("CONSUL_INDEX_HEADER") { config.discovery.index_header = v; }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingEnv(missing))
    }
}

/// Load, overlay environment, and validate.
///
/// `path` is optional; without it the defaults are the base layer.
pub fn load_config<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        REQUIRED_ENV
            .iter()
            .map(|name| {
                let value = match *name {
                    "CONSUL_ADDRESS" => "consul:8500",
                    "JAEGER_ADDRESS" => "jaeger:4317",
                    "CONSUL_INDEX_HEADER" => "X-Consul-Index",
                    _ => "value",
                };
                (*name, value.to_string())
            })
            .collect()
    }

    #[test]
    fn test_all_required_env_applied() {
        let env = full_env();
        let config = load_config(None, |k| env.get(k).cloned()).unwrap();
        assert_eq!(config.discovery.address, "consul:8500");
        assert_eq!(config.tracing.collector_address, "jaeger:4317");
        assert_eq!(config.open_api.client_secret.expose(), "value");
    }

    #[test]
    fn test_missing_env_reports_every_name() {
        let mut env = full_env();
        env.remove("JAEGER_ADDRESS");
        env.insert("NAVER_CLIENT_ID", String::new());

        match load_config(None, |k| env.get(k).cloned()) {
            Err(ConfigError::MissingEnv(names)) => {
                assert_eq!(names, vec!["JAEGER_ADDRESS", "NAVER_CLIENT_ID"]);
            }
            other => panic!("expected MissingEnv, got {:?}", other),
        }
    }

    #[test]
    fn test_file_layer_then_env() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(
            tmp.path(),
            r#"
            [listener]
            bind_address = "127.0.0.1:8080"

            [services]
            strategy = "random"
            call_timeout_ms = 250

            [discovery]
            address = "overridden-by-env"
            "#,
        )
        .unwrap();

        let env = full_env();
        let config = load_config(Some(tmp.path()), |k| env.get(k).cloned()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert_eq!(config.services.call_timeout_ms, 250);
        assert_eq!(config.discovery.address, "consul:8500");
        assert_eq!(config.services.auth, "DMS.SMS.v1.service.auth");
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
    }
}
