//! TLS configuration

use serde::{Deserialize, Serialize};
use spindle_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Store format accepted for key and trust stores
pub const PEM_STORE_TYPE: &str = "PEM";

/// Client certificate policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientAuth {
    /// Client certificates are not requested
    #[default]
    #[serde(alias = "none")]
    None,
    /// Client certificates are requested but optional
    #[serde(alias = "want")]
    Want,
    /// Client certificates are required
    #[serde(alias = "need")]
    Need,
}

/// TLS configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TlsConfig {
    /// Whether TLS is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// PEM file holding the certificate chain followed by the private key
    #[serde(default)]
    pub key_store: Option<PathBuf>,

    /// Key store format (only `PEM` is supported)
    #[serde(default)]
    pub key_store_type: Option<String>,

    /// Key store password
    #[serde(default)]
    pub key_store_password: Option<String>,

    /// Private key password
    #[serde(default)]
    pub key_password: Option<String>,

    /// PEM certificate chain, used together with `certificate_private_key`
    #[serde(default)]
    pub certificate: Option<PathBuf>,

    /// PEM private key matching `certificate`
    #[serde(default)]
    pub certificate_private_key: Option<PathBuf>,

    /// PEM bundle of CA certificates trusted for client authentication
    #[serde(default)]
    pub trust_store: Option<PathBuf>,

    /// Trust store format (only `PEM` is supported)
    #[serde(default)]
    pub trust_store_type: Option<String>,

    /// Trust store password
    #[serde(default)]
    pub trust_store_password: Option<String>,

    /// Enabled protocol versions (`TLSv1.2`, `TLSv1.3`); empty enables both
    #[serde(default)]
    pub enabled_protocols: Vec<String>,

    /// Enabled cipher suite names; empty keeps the provider defaults
    #[serde(default)]
    pub ciphers: Vec<String>,

    /// Client certificate policy
    #[serde(default)]
    pub client_auth: ClientAuth,

    /// Host names put in the self-signed certificate when no key material is configured
    #[serde(default = "default_self_signed_hosts")]
    pub self_signed_hosts: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_self_signed_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            key_store: None,
            key_store_type: None,
            key_store_password: None,
            key_password: None,
            certificate: None,
            certificate_private_key: None,
            trust_store: None,
            trust_store_type: None,
            trust_store_password: None,
            enabled_protocols: Vec::new(),
            ciphers: Vec::new(),
            client_auth: ClientAuth::None,
            self_signed_hosts: default_self_signed_hosts(),
        }
    }
}

impl TlsConfig {
    /// Whether any server key material is configured
    pub fn has_key_material(&self) -> bool {
        self.key_store.is_some() || self.certificate.is_some()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        check_store_type("key store", self.key_store_type.as_deref())?;
        check_store_type("trust store", self.trust_store_type.as_deref())?;

        if self.key_store_password.is_some() || self.key_password.is_some() {
            return Err(Error::Config(
                "Encrypted key stores are not supported; remove key-store-password and key-password"
                    .to_string(),
            ));
        }
        if self.trust_store_password.is_some() {
            return Err(Error::Config(
                "Encrypted trust stores are not supported; remove trust-store-password".to_string(),
            ));
        }

        if self.key_store.is_some() && self.certificate.is_some() {
            return Err(Error::Config(
                "Configure either key-store or certificate, not both".to_string(),
            ));
        }
        if self.certificate.is_some() != self.certificate_private_key.is_some() {
            return Err(Error::Config(
                "certificate and certificate-private-key must be configured together".to_string(),
            ));
        }

        for path in [
            self.key_store.as_deref(),
            self.certificate.as_deref(),
            self.certificate_private_key.as_deref(),
            self.trust_store.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            check_exists(path)?;
        }

        if self.client_auth != ClientAuth::None && self.trust_store.is_none() {
            return Err(Error::Config(format!(
                "client-auth {:?} requires a trust-store",
                self.client_auth
            )));
        }

        crate::acceptor::protocol_versions(&self.enabled_protocols)?;
        crate::acceptor::cipher_suites(&self.ciphers)?;

        Ok(())
    }
}

fn check_store_type(store: &str, store_type: Option<&str>) -> Result<()> {
    match store_type {
        None => Ok(()),
        Some(t) if t.eq_ignore_ascii_case(PEM_STORE_TYPE) => Ok(()),
        Some(t) => Err(Error::Config(format!(
            "Unsupported {store} type: {t} (only {PEM_STORE_TYPE} is supported)"
        ))),
    }
}

fn check_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::Config(format!("File not found: {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = TlsConfig::default();
        assert!(config.enabled);
        assert!(!config.has_key_material());
        assert_eq!(config.client_auth, ClientAuth::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_auth_parsing() {
        let config: TlsConfig = serde_json::from_str(r#"{"client_auth": "NEED"}"#).unwrap();
        assert_eq!(config.client_auth, ClientAuth::Need);

        let config: TlsConfig = serde_json::from_str(r#"{"client_auth": "want"}"#).unwrap();
        assert_eq!(config.client_auth, ClientAuth::Want);

        assert!(serde_json::from_str::<TlsConfig>(r#"{"client_auth": "MAYBE"}"#).is_err());
    }

    #[test]
    fn test_rejects_non_pem_store() {
        let config = TlsConfig {
            key_store_type: Some("PKCS12".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_passwords() {
        let config = TlsConfig {
            key_password: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_auth_requires_trust_store() {
        let config = TlsConfig {
            client_auth: ClientAuth::Want,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_protocol() {
        let config = TlsConfig {
            enabled_protocols: vec!["SSLv3".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_key_store() {
        let config = TlsConfig {
            key_store: Some(PathBuf::from("/nonexistent/server.pem")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
