//! Certificate, key and trust store loading

use crate::config::TlsConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::RootCertStore;
use rustls_pemfile::{certs, private_key};
use spindle_core::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::Path;
use tracing::{info, warn};

/// Server certificate chain with its private key
#[derive(Debug)]
pub struct Identity {
    /// Certificate chain, leaf first
    pub certificates: Vec<CertificateDer<'static>>,
    /// Private key for the leaf certificate
    pub private_key: PrivateKeyDer<'static>,
    /// Whether the identity was generated on the fly
    pub self_signed: bool,
}

fn open(path: &Path, what: &str) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        Error::Config(format!("Failed to open {what} file {}: {e}", path.display()))
    })?;
    Ok(BufReader::new(file))
}

fn read_certificates(
    reader: &mut BufReader<File>,
    path: &Path,
) -> Result<Vec<CertificateDer<'static>>> {
    let certs = certs(reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("Failed to parse certificates: {e}")))?;

    if certs.is_empty() {
        return Err(Error::Config(format!(
            "No certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn read_private_key(
    reader: &mut BufReader<File>,
    path: &Path,
) -> Result<PrivateKeyDer<'static>> {
    private_key(reader)
        .map_err(|e| Error::Config(format!("Failed to parse private key: {e}")))?
        .ok_or_else(|| Error::Config(format!("No private key found in {}", path.display())))
}

/// Load certificates from a PEM file
pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = open(path, "certificate")?;
    let certs = read_certificates(&mut reader, path)?;

    info!(
        path = %path.display(),
        count = certs.len(),
        "Loaded TLS certificates"
    );

    Ok(certs)
}

/// Load private key from a PEM file
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let mut reader = open(path, "private key")?;
    let key = read_private_key(&mut reader, path)?;

    info!(path = %path.display(), "Loaded TLS private key");

    Ok(key)
}

/// Load a PEM key store holding the certificate chain and the private key
pub fn load_key_store(path: &Path) -> Result<Identity> {
    let mut reader = open(path, "key store")?;
    let certificates = read_certificates(&mut reader, path)?;
    reader.rewind()?;
    let private_key = read_private_key(&mut reader, path)?;

    info!(
        path = %path.display(),
        count = certificates.len(),
        "Loaded TLS key store"
    );

    Ok(Identity {
        certificates,
        private_key,
        self_signed: false,
    })
}

/// Load a PEM bundle of trusted CA certificates
pub fn load_trust_store(path: &Path) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    for cert in load_certificates(path)? {
        roots
            .add(cert)
            .map_err(|e| Error::Config(format!("Invalid trust store certificate: {e}")))?;
    }
    Ok(roots)
}

/// Generate a self-signed certificate for the given host names
pub fn self_signed(hosts: &[String]) -> Result<Identity> {
    let generated = rcgen::generate_simple_self_signed(hosts.to_vec())
        .map_err(|e| Error::Tls(format!("Failed to generate self-signed certificate: {e}")))?;

    let certificate = generated.cert.der().clone();
    let private_key =
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(generated.key_pair.serialize_der()));

    Ok(Identity {
        certificates: vec![certificate],
        private_key,
        self_signed: true,
    })
}

/// Resolve the server identity from configuration, falling back to a
/// self-signed certificate when no key material is configured
pub fn load_identity(config: &TlsConfig) -> Result<Identity> {
    if let Some(path) = &config.key_store {
        return load_key_store(path);
    }

    if let (Some(cert), Some(key)) = (&config.certificate, &config.certificate_private_key) {
        return Ok(Identity {
            certificates: load_certificates(cert)?,
            private_key: load_private_key(key)?,
            self_signed: false,
        });
    }

    warn!(
        hosts = ?config.self_signed_hosts,
        "No TLS key material configured, using a self-signed certificate"
    );
    self_signed(&config.self_signed_hosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_key_store() -> tempfile::NamedTempFile {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}{}",
            generated.cert.pem(),
            generated.key_pair.serialize_pem()
        )
        .unwrap();
        file
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_certificates(Path::new("/nonexistent/cert.pem"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_key_store() {
        let file = write_key_store();
        let identity = load_key_store(file.path()).unwrap();
        assert_eq!(identity.certificates.len(), 1);
        assert!(!identity.self_signed);
    }

    #[test]
    fn test_load_trust_store() {
        let file = write_key_store();
        let roots = load_trust_store(file.path()).unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_self_signed_fallback() {
        let identity = load_identity(&TlsConfig::default()).unwrap();
        assert!(identity.self_signed);
        assert_eq!(identity.certificates.len(), 1);
    }
}
