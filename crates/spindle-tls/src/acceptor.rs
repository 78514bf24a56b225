//! TLS acceptor implementation

use crate::config::{ClientAuth, TlsConfig};
use crate::loader::{load_identity, load_trust_store};
use rustls::crypto::{aws_lc_rs, CryptoProvider};
use rustls::server::{ServerConfig, ServerConnection, WebPkiClientVerifier};
use rustls::{SupportedCipherSuite, SupportedProtocolVersion};
use spindle_core::{Error, Result, TlsSession};
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor as RustlsAcceptor;
use tracing::info;

/// Resolve protocol names to rustls versions; an empty list enables all
pub fn protocol_versions(names: &[String]) -> Result<Vec<&'static SupportedProtocolVersion>> {
    if names.is_empty() {
        return Ok(rustls::ALL_VERSIONS.to_vec());
    }

    names
        .iter()
        .map(|name| match name.as_str() {
            "TLSv1.2" => Ok(&rustls::version::TLS12),
            "TLSv1.3" => Ok(&rustls::version::TLS13),
            other => Err(Error::Config(format!(
                "Unsupported TLS protocol: {other} (expected TLSv1.2 or TLSv1.3)"
            ))),
        })
        .collect()
}

/// Resolve cipher suite names; an empty list keeps the provider defaults.
///
/// Names match the suite identifiers (`TLS13_AES_128_GCM_SHA256`) as well as
/// IANA spelling (`TLS_AES_128_GCM_SHA256`).
pub fn cipher_suites(names: &[String]) -> Result<Vec<SupportedCipherSuite>> {
    names
        .iter()
        .map(|name| {
            aws_lc_rs::ALL_CIPHER_SUITES
                .iter()
                .find(|suite| {
                    let id = format!("{:?}", suite.suite());
                    id == *name || id.replacen("TLS13_", "TLS_", 1) == *name
                })
                .copied()
                .ok_or_else(|| Error::Config(format!("Unsupported cipher suite: {name}")))
        })
        .collect()
}

/// Snapshot the negotiated parameters of a server connection
pub fn session_of(conn: &ServerConnection) -> TlsSession {
    TlsSession {
        protocol: conn.protocol_version().map(|v| format!("{v:?}")),
        cipher_suite: conn
            .negotiated_cipher_suite()
            .map(|s| format!("{:?}", s.suite())),
        alpn_protocol: conn
            .alpn_protocol()
            .map(|p| String::from_utf8_lossy(p).into_owned()),
        server_name: conn.server_name().map(str::to_string),
        peer_certificates: conn
            .peer_certificates()
            .map(|certs| certs.iter().map(|c| c.to_vec()).collect())
            .unwrap_or_default(),
    }
}

/// TLS connection acceptor
#[derive(Clone)]
pub struct TlsAcceptor {
    inner: RustlsAcceptor,
    self_signed: bool,
}

impl TlsAcceptor {
    /// Create a new TLS acceptor from configuration
    pub fn new(config: &TlsConfig) -> Result<Self> {
        config.validate()?;

        let identity = load_identity(config)?;

        let mut provider = aws_lc_rs::default_provider();
        if !config.ciphers.is_empty() {
            provider.cipher_suites = cipher_suites(&config.ciphers)?;
        }
        let provider: Arc<CryptoProvider> = Arc::new(provider);
        let versions = protocol_versions(&config.enabled_protocols)?;

        let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
            .with_protocol_versions(&versions)
            .map_err(|e| Error::Tls(format!("Incompatible protocols and ciphers: {e}")))?;

        let builder = match (config.client_auth, &config.trust_store) {
            (ClientAuth::None, _) => builder.with_no_client_auth(),
            (auth, Some(trust_store)) => {
                let roots = Arc::new(load_trust_store(trust_store)?);
                let verifier = WebPkiClientVerifier::builder_with_provider(roots, provider);
                let verifier = if auth == ClientAuth::Want {
                    verifier.allow_unauthenticated()
                } else {
                    verifier
                };
                let verifier = verifier
                    .build()
                    .map_err(|e| Error::Tls(format!("Failed to build client verifier: {e}")))?;
                builder.with_client_cert_verifier(verifier)
            }
            (auth, None) => {
                return Err(Error::Config(format!(
                    "client-auth {auth:?} requires a trust-store"
                )))
            }
        };

        let mut server_config = builder
            .with_single_cert(identity.certificates, identity.private_key)
            .map_err(|e| Error::Config(format!("Failed to build TLS config: {e}")))?;

        // Configure ALPN protocols (HTTP/1.1 and HTTP/2)
        server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

        info!(
            self_signed = identity.self_signed,
            client_auth = ?config.client_auth,
            protocols = ?config.enabled_protocols,
            "TLS acceptor initialized"
        );

        Ok(Self {
            inner: RustlsAcceptor::from(Arc::new(server_config)),
            self_signed: identity.self_signed,
        })
    }

    /// Whether the served certificate was generated on the fly
    pub fn is_self_signed(&self) -> bool {
        self.self_signed
    }

    /// Accept a TLS connection and snapshot the negotiated session
    pub async fn accept<IO>(&self, stream: IO) -> Result<(TlsStream<IO>, TlsSession)>
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        let stream = self
            .inner
            .accept(stream)
            .await
            .map_err(|e| Error::Tls(format!("TLS handshake failed: {e}")))?;
        let session = session_of(stream.get_ref().1);
        Ok((stream, session))
    }
}

impl fmt::Debug for TlsAcceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsAcceptor")
            .field("self_signed", &self.self_signed)
            .finish_non_exhaustive()
    }
}
