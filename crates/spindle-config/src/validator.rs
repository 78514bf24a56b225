//! Configuration validation

use crate::Config;
use spindle_core::{Error, Result};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_observability(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    let server = &config.server;

    if server.shutdown_timeout.as_secs() > 300 {
        tracing::warn!("shutdown_timeout is very high (>5 minutes)");
    }

    if let Some(tls) = server.tls() {
        tls.validate()?;
    }

    Ok(())
}

fn validate_observability(config: &Config) -> Result<()> {
    let observability = &config.observability;

    match observability.logging.format.as_str() {
        "json" | "text" => {}
        other => {
            return Err(Error::Config(format!(
                "Invalid log format: {other} (must be json or text)"
            )))
        }
    }

    let rate = observability.tracing.sample_rate;
    if !(0.0..=1.0).contains(&rate) {
        return Err(Error::Config(format!(
            "tracing sample_rate must be between 0.0 and 1.0, got {rate}"
        )));
    }

    if observability.tracing.service_name.is_empty() {
        return Err(Error::Config(
            "tracing service_name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_tls::{ClientAuth, TlsConfig};

    #[test]
    fn test_valid_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_sample_rate() {
        let mut config = Config::default();
        config.observability.tracing.sample_rate = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.observability.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_tls() {
        let mut config = Config::default();
        config.server.ssl = Some(TlsConfig {
            client_auth: ClientAuth::Need,
            ..Default::default()
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_disabled_tls_not_validated() {
        let mut config = Config::default();
        config.server.ssl = Some(TlsConfig {
            enabled: false,
            key_store_type: Some("JKS".to_string()),
            ..Default::default()
        });
        assert!(validate_config(&config).is_ok());
    }
}
