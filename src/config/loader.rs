//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Local bind address override.
pub const LISTEN_ADDR_ENV_VAR: &str = "LISTEN_ADDR";
/// Local bind port override.
pub const LISTEN_PORT_ENV_VAR: &str = "LISTEN_PORT";
/// Remote address override.
pub const REMOTE_ADDR_ENV_VAR: &str = "REMOTE_ADDR";
/// Remote port override.
pub const REMOTE_PORT_ENV_VAR: &str = "REMOTE_PORT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value {:?} for environment variable {}", value, var)
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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let config = read_config_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve the startup configuration.
///
/// Starts from the TOML file when one is given (defaults otherwise), applies
/// the `LISTEN_ADDR`, `LISTEN_PORT`, `REMOTE_ADDR` and `REMOTE_PORT`
/// environment overrides, then validates the result.
pub fn resolve_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are ignored so that an unset-but-exported variable does not
/// clobber the file configuration.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(addr) = read(LISTEN_ADDR_ENV_VAR) {
        config.listener.bind_address = addr.trim().to_string();
    }
    if let Some(port) = read(LISTEN_PORT_ENV_VAR) {
        config.listener.bind_port = parse_port(LISTEN_PORT_ENV_VAR, &port)?;
    }
    if let Some(addr) = read(REMOTE_ADDR_ENV_VAR) {
        config.upstream.address = addr.trim().to_string();
    }
    if let Some(port) = read(REMOTE_PORT_ENV_VAR) {
        config.upstream.port = parse_port(REMOTE_PORT_ENV_VAR, &port)?;
    }

    Ok(())
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RelayConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("LISTEN_ADDR", "127.0.0.1"),
                ("LISTEN_PORT", "18332"),
                ("REMOTE_ADDR", "node.example"),
                ("REMOTE_PORT", " 8332 "),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.socket_address(), "127.0.0.1:18332");
        assert_eq!(config.upstream.endpoint(), "https://node.example:8332/");
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let mut config = RelayConfig::default();
        apply_env_overrides(&mut config, env(&[("REMOTE_ADDR", "")])).unwrap();
        assert_eq!(config.upstream.address, "127.0.0.1");
    }

    #[test]
    fn test_invalid_port() {
        let mut config = RelayConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("REMOTE_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "REMOTE_PORT", .. }));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_load_config_file() {
        let path = std::env::temp_dir().join(format!("jsonrpc-relay-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[upstream]\naddress = \"10.0.0.2\"\nport = 18443\nscheme = \"http\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.upstream.endpoint(), "http://10.0.0.2:18443/");
    }

    #[test]
    fn test_example_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("relay.example.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.upstream.endpoint(), "https://node.internal:8332/");
        assert_eq!(config.listener.socket_address(), "127.0.0.1:8332");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/relay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
