//! Configuration types

use serde::{Deserialize, Serialize};
use spindle_tls::TlsConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Web server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Observability
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    /// Bind address (all interfaces when unset)
    #[serde(default)]
    pub address: Option<IpAddr>,

    /// Bind port (0 = ephemeral)
    #[serde(default = "default_port")]
    pub port: u16,

    /// TLS configuration
    #[serde(default)]
    pub ssl: Option<TlsConfig>,

    /// HTTP/2 configuration
    #[serde(default)]
    pub http2: Http2Config,

    /// Compression configuration
    #[serde(default)]
    pub compression: CompressionConfig,

    /// Graceful shutdown timeout (wait for in-flight requests)
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            ssl: None,
            http2: Http2Config::default(),
            compression: CompressionConfig::default(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl ServerSettings {
    /// Socket address to bind, defaulting to all IPv4 interfaces
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.address.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            self.port,
        )
    }

    /// TLS configuration, if present and enabled
    pub fn tls(&self) -> Option<&TlsConfig> {
        self.ssl.as_ref().filter(|ssl| ssl.enabled)
    }
}

/// HTTP/2 configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Http2Config {
    /// Enable HTTP/2
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for Http2Config {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Compression configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompressionConfig {
    /// Enable compression
    #[serde(default)]
    pub enabled: bool,

    /// Minimum response size to compress (in bytes)
    #[serde(default)]
    pub min_response_size: Option<usize>,

    /// MIME types to compress
    #[serde(default)]
    pub mime_types: Vec<String>,
}

/// Observability configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Request tracing configuration
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Request tracing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TracingConfig {
    /// Decorate the server with the HTTP tracing service
    #[serde(default)]
    pub enabled: bool,

    /// Fraction of requests to trace (0.0 - 1.0)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f32,

    /// Local service name recorded on every span
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_rate: default_sample_rate(),
            service_name: default_service_name(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_sample_rate() -> f32 {
    1.0
}

fn default_service_name() -> String {
    "spindle".to_string()
}
