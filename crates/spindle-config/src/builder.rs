//! Configuration builder

use crate::types::{Config, ServerSettings};
use spindle_tls::TlsConfig;
use std::net::IpAddr;
use std::time::Duration;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the server settings
    pub fn server(mut self, server: ServerSettings) -> Self {
        self.config.server = server;
        self
    }

    /// Set bind address
    pub fn address(mut self, address: IpAddr) -> Self {
        self.config.server.address = Some(address);
        self
    }

    /// Set bind port (0 = ephemeral)
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Enable TLS
    pub fn ssl(mut self, ssl: TlsConfig) -> Self {
        self.config.server.ssl = Some(ssl);
        self
    }

    /// Enable or disable HTTP/2
    pub fn http2(mut self, enabled: bool) -> Self {
        self.config.server.http2.enabled = enabled;
        self
    }

    /// Set graceful shutdown timeout
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.server.shutdown_timeout = timeout;
        self
    }

    /// Enable the HTTP tracing decorator
    pub fn tracing(mut self, service_name: impl Into<String>, sample_rate: f32) -> Self {
        let tracing = &mut self.config.observability.tracing;
        tracing.enabled = true;
        tracing.service_name = service_name.into();
        tracing.sample_rate = sample_rate;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> spindle_core::Result<Config> {
        crate::validator::validate_config(&self.config)?;
        Ok(self.config)
    }
}
