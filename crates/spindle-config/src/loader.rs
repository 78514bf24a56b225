//! Configuration loading

use crate::{Config, ConfigFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use spindle_core::{Error, Result};
use std::env;
use std::fs;
use std::path::Path;

// Matches ${VAR} or ${VAR:-default}
static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}").expect("valid env var pattern")
});

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    let format = ConfigFormat::from_path(path)?;

    load_from_str(&content, format)
}

/// Expand environment variables in configuration string
/// Supports syntax: ${VAR} and ${VAR:-default}
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut last_match = 0;

    for cap in ENV_VAR.captures_iter(content) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let var_name = &cap[1];

        let value = match env::var(var_name) {
            Ok(val) => val,
            Err(_) => match cap.get(3) {
                Some(default) => default.as_str().to_string(),
                None => {
                    return Err(Error::Config(format!(
                        "Environment variable '{var_name}' not set and no default provided"
                    )));
                }
            },
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);

    Ok(result)
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let expanded_content = expand_env_vars(content)?;

    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {e}")))?,
        ConfigFormat::Toml => toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON: {e}")))?,
    };

    Ok(config)
}

/// Load configuration from a file and validate it
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = load_from_file(path)?;
    crate::validator::validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML_CONFIG: &str = r#"
server:
  address: "127.0.0.1"
  port: 9443
  shutdown_timeout: "5s"
  http2:
    enabled: false
  ssl:
    enabled: true
    client_auth: WANT
    enabled_protocols: ["TLSv1.3"]

observability:
  logging:
    level: "debug"
    format: "json"
  tracing:
    enabled: true
    sample_rate: 0.5
"#;

    #[test]
    fn test_load_yaml() {
        let config = load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.server.port, 9443);
        assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:9443");
        assert_eq!(config.server.shutdown_timeout.as_secs(), 5);
        assert!(!config.server.http2.enabled);
        let ssl = config.server.tls().unwrap();
        assert_eq!(ssl.client_auth, spindle_tls::ClientAuth::Want);
        assert_eq!(ssl.enabled_protocols, vec!["TLSv1.3".to_string()]);
        assert_eq!(config.observability.tracing.sample_rate, 0.5);
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
[server]
port = 0

[server.compression]
enabled = true
"#;
        let config = load_from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.server.port, 0);
        assert!(config.server.compression.enabled);
    }

    #[test]
    fn test_invalid_yaml() {
        let invalid = "invalid: [yaml";
        let result = load_from_str(invalid, ConfigFormat::Yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_var_with_default() {
        env::remove_var("SPINDLE_UNDEFINED_PORT");

        let config = load_from_str(
            "server:\n  port: ${SPINDLE_UNDEFINED_PORT:-7070}\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(config.server.port, 7070);
    }

    #[test]
    fn test_env_var_override_default() {
        env::set_var("SPINDLE_TEST_PORT", "9191");

        let config = load_from_str(
            "server:\n  port: ${SPINDLE_TEST_PORT:-7070}\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(config.server.port, 9191);

        env::remove_var("SPINDLE_TEST_PORT");
    }

    #[test]
    fn test_missing_env_var_no_default() {
        env::remove_var("SPINDLE_MISSING_VAR");

        let result = load_from_str("server:\n  port: ${SPINDLE_MISSING_VAR}\n", ConfigFormat::Yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("SPINDLE_MISSING_VAR"));
    }

    #[test]
    fn test_multiple_env_vars() {
        env::set_var("SPINDLE_HOST", "localhost");
        env::set_var("SPINDLE_PORT", "5432");

        let expanded = expand_env_vars("https://${SPINDLE_HOST}:${SPINDLE_PORT}/").unwrap();
        assert_eq!(expanded, "https://localhost:5432/");

        env::remove_var("SPINDLE_HOST");
        env::remove_var("SPINDLE_PORT");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"server": {{"port": 0, "shutdown_timeout": "1s"}}}}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 0);
    }
}
