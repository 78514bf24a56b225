//! Per-request context carried in request extensions

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

/// Context attached to each request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request ID for tracing
    pub request_id: String,

    /// Address of the peer
    pub remote_addr: Option<SocketAddr>,

    /// Address the connection was accepted on
    pub local_addr: Option<SocketAddr>,

    /// Negotiated TLS session, `None` for plaintext connections
    pub tls: Option<Arc<TlsSession>>,

    /// RPC method name, when an upstream layer recognised one
    pub rpc_method: Option<String>,

    /// Custom metadata that decorators can attach
    pub metadata: Arc<HashMap<String, serde_json::Value>>,
}

impl RequestContext {
    /// Create a new request context
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            remote_addr: None,
            local_addr: None,
            tls: None,
            rpc_method: None,
            metadata: Arc::new(HashMap::new()),
        }
    }

    /// Set the connection addresses
    pub fn with_addrs(mut self, remote: SocketAddr, local: SocketAddr) -> Self {
        self.remote_addr = Some(remote);
        self.local_addr = Some(local);
        self
    }

    /// Attach the negotiated TLS session
    pub fn with_tls(mut self, tls: Arc<TlsSession>) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Whether the request arrived over TLS
    pub fn is_secure(&self) -> bool {
        self.tls.is_some()
    }

    /// Get metadata value
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Set metadata value (creates new Arc)
    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let mut metadata = (*self.metadata).clone();
        metadata.insert(key.into(), value);
        self.metadata = Arc::new(metadata);
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of a negotiated TLS session, taken once after the handshake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSession {
    /// Protocol version, e.g. `TLSv1_3`
    pub protocol: Option<String>,

    /// Negotiated cipher suite name
    pub cipher_suite: Option<String>,

    /// Negotiated ALPN protocol
    pub alpn_protocol: Option<String>,

    /// SNI host name sent by the client
    pub server_name: Option<String>,

    /// DER-encoded peer certificate chain, leaf first
    pub peer_certificates: Vec<Vec<u8>>,
}

impl TlsSession {
    /// Whether the client presented a certificate
    pub fn has_peer_certificates(&self) -> bool {
        !self.peer_certificates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context() {
        let mut ctx = RequestContext::new();
        assert!(!ctx.request_id.is_empty());
        assert!(!ctx.is_secure());

        ctx.set_metadata("tenant", serde_json::json!("acme"));
        assert_eq!(ctx.get_metadata("tenant"), Some(&serde_json::json!("acme")));
    }

    #[test]
    fn test_with_tls() {
        let session = TlsSession {
            protocol: Some("TLSv1_3".to_string()),
            ..Default::default()
        };
        let ctx = RequestContext::new().with_tls(Arc::new(session));
        assert!(ctx.is_secure());
        assert!(!ctx.tls.as_ref().unwrap().has_peer_certificates());
    }
}
