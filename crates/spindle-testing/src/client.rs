//! HTTP and HTTPS clients for integration tests

use crate::resolver::DummyResolver;
use anyhow::{Context as _, Result};
use bytes::Bytes;
use http::header::HOST;
use http::{HeaderValue, Method, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{aws_lc_rs, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// Plain HTTP client resolving every host to localhost
pub type TestClient = Client<HttpConnector<DummyResolver>, Full<Bytes>>;

/// Build a plain HTTP client backed by [`DummyResolver`]
pub fn http_client() -> TestClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new_with_resolver(DummyResolver))
}

/// Send a request and collect the response body
pub async fn send(client: &TestClient, request: Request<Full<Bytes>>) -> Result<Response<Bytes>> {
    let response = client.request(request).await.context("request failed")?;
    let (parts, body) = response.into_parts();
    let body = body.collect().await.context("reading body failed")?.to_bytes();
    Ok(Response::from_parts(parts, body))
}

/// Request to `http://example.com:<port><path>`
pub fn request(
    method: Method,
    port: u16,
    path: &str,
    body: impl Into<Bytes>,
) -> Result<Request<Full<Bytes>>> {
    Ok(Request::builder()
        .method(method)
        .uri(format!("http://example.com:{}{}", port, path))
        .body(Full::new(body.into()))?)
}

/// Accepts any server certificate
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// TLS connector that trusts any server certificate
pub fn insecure_tls_connector() -> Result<TlsConnector> {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let mut config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .context("unsupported protocol versions")?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Send one request over HTTPS/1.1 to `addr` and collect the response.
///
/// The request URI should be in origin form (`/path`); a `Host` header is
/// added when missing.
pub async fn send_tls(
    addr: SocketAddr,
    server_name: &str,
    mut request: Request<Full<Bytes>>,
) -> Result<Response<Bytes>> {
    if !request.headers().contains_key(HOST) {
        let host = HeaderValue::from_str(&format!("{}:{}", server_name, addr.port()))?;
        request.headers_mut().insert(HOST, host);
    }

    let tcp = TcpStream::connect(addr).await.context("connect failed")?;
    let domain = ServerName::try_from(server_name.to_string()).context("invalid server name")?;
    let tls = insecure_tls_connector()?
        .connect(domain, tcp)
        .await
        .context("TLS handshake failed")?;

    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(tls)).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("Test connection closed: {}", e);
        }
    });

    let response = sender.send_request(request).await?;
    let (parts, body) = response.into_parts();
    let body = body.collect().await?.to_bytes();
    Ok(Response::from_parts(parts, body))
}
