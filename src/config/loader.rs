//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: RelayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: RelayConfig = toml::from_str("").expect("empty config should deserialize");

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.listener.max_connections, 10_000);
        assert_eq!(config.upstream.address, "127.0.0.1:9090");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [listener]
            bind_address = "127.0.0.1:3128"
            max_connections = 256

            [upstream]
            address = "10.0.0.5:8000"

            [observability]
            log_level = "debug"
        "#;
        let config: RelayConfig = toml::from_str(toml).expect("config should deserialize");

        assert_eq!(config.listener.bind_address, "127.0.0.1:3128");
        assert_eq!(config.listener.max_connections, 256);
        assert_eq!(config.upstream.address, "10.0.0.5:8000");
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let error = load_config(Path::new("/nonexistent/relay.toml"))
            .expect_err("missing file should fail to load");

        assert!(matches!(error, ConfigError::Io(_)));
    }
}
