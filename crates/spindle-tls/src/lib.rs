//! TLS support for Spindle
//!
//! Provides HTTPS for the web server with support for:
//! - TLS 1.2 and TLS 1.3, restricted by configured protocol names
//! - PEM key stores (certificate chain plus private key) and PEM trust stores
//! - Optional or required client certificates
//! - Cipher suite selection by name
//! - A self-signed fallback certificate when no key material is configured
//!
//! The negotiated session of every accepted connection is captured as a
//! [`spindle_core::TlsSession`] so request adapters can expose it.

pub mod acceptor;
pub mod config;
pub mod loader;

pub use acceptor::TlsAcceptor;
pub use config::{ClientAuth, TlsConfig};
pub use loader::{load_certificates, load_identity, load_private_key, load_trust_store, Identity};
