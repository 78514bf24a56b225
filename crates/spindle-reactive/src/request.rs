//! Inbound request adapter

use once_cell::sync::OnceCell;
use percent_encoding::percent_decode_str;
use spindle_core::body::{self, Body, BodyStream};
use spindle_core::cookie::{parse_cookie_header, Cookie, CookieMap};
use spindle_core::{Error, HeaderCollection, RequestContext, Result, TlsSession};
use http::{Method, Request, Uri, Version};
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Check that a request target only carries well-formed percent escapes and
/// no whitespace or control characters
pub fn validate_target(target: &str) -> Result<()> {
    let bytes = target.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3);
                match escape {
                    Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                    _ => {
                        return Err(Error::malformed_target(
                            target,
                            format!("invalid percent escape at offset {i}"),
                        ))
                    }
                }
            }
            b if b.is_ascii_control() || b == b' ' => {
                return Err(Error::malformed_target(
                    target,
                    format!("illegal character {:?} at offset {i}", b as char),
                ))
            }
            _ => i += 1,
        }
    }
    Ok(())
}

fn decode_query_component(target: &str, component: &str) -> Result<String> {
    let replaced;
    let component = if component.contains('+') {
        replaced = component.replace('+', " ");
        replaced.as_str()
    } else {
        component
    };
    percent_decode_str(component)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::malformed_target(target, "decoded target is not valid UTF-8"))
}

/// TLS details of the connection a request arrived on
#[derive(Debug, Clone)]
pub struct TlsInfo {
    session: Arc<TlsSession>,
}

impl TlsInfo {
    fn new(session: Arc<TlsSession>) -> Self {
        Self { session }
    }

    /// Negotiated protocol version
    pub fn protocol(&self) -> Option<&str> {
        self.session.protocol.as_deref()
    }

    /// Negotiated cipher suite
    pub fn cipher_suite(&self) -> Option<&str> {
        self.session.cipher_suite.as_deref()
    }

    /// SNI host name requested by the client
    pub fn server_name(&self) -> Option<&str> {
        self.session.server_name.as_deref()
    }

    /// DER-encoded client certificate chain, empty when none was presented
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        &self.session.peer_certificates
    }
}

/// Read-only view of an inbound request.
///
/// Headers are translated once on construction. Cookies and TLS details are
/// computed on first access and cached. The body can be taken once.
pub struct ServerHttpRequest {
    context: RequestContext,
    method: Method,
    uri: Uri,
    version: Version,
    path: String,
    headers: HeaderCollection,
    body: Mutex<Option<Body>>,
    cookies: OnceCell<CookieMap>,
    tls_info: OnceCell<Option<TlsInfo>>,
}

impl ServerHttpRequest {
    /// Adapt a native request, rejecting malformed targets before anything
    /// else is touched
    pub fn new(context: RequestContext, request: Request<Body>) -> Result<Self> {
        let (parts, body) = request.into_parts();

        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| parts.uri.path());
        validate_target(target)?;
        let path = percent_decode_str(parts.uri.path())
            .decode_utf8_lossy()
            .into_owned();

        Ok(Self {
            context,
            method: parts.method,
            headers: HeaderCollection::from_header_map(&parts.headers),
            uri: parts.uri,
            version: parts.version,
            path,
            body: Mutex::new(Some(body)),
            cookies: OnceCell::new(),
            tls_info: OnceCell::new(),
        })
    }

    /// Request context
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Unique request ID
    pub fn id(&self) -> &str {
        &self.context.request_id
    }

    /// Request method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request method token as received
    pub fn method_value(&self) -> &str {
        self.method.as_str()
    }

    /// Request target
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Protocol version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Percent-decoded path; escapes that are not UTF-8 become U+FFFD
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Decoded query parameters in order of appearance
    pub fn query_params(&self) -> Vec<(String, String)> {
        let Some(query) = self.query() else {
            return Vec::new();
        };
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                let name = decode_query_component(query, name).ok()?;
                let value = decode_query_component(query, value).ok()?;
                Some((name, value))
            })
            .collect()
    }

    /// Request headers
    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    /// Cookies from every `Cookie` header, parsed on first access
    pub fn cookies(&self) -> &CookieMap {
        self.cookies.get_or_init(|| {
            let mut cookies = CookieMap::new();
            for header in self.headers.get_all(http::header::COOKIE.as_str()) {
                for cookie in parse_cookie_header(header) {
                    cookies.add(cookie.name().to_string(), cookie);
                }
            }
            cookies
        })
    }

    /// First cookie with a name
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies().get_first(name)
    }

    /// TLS details, `None` for plaintext connections
    pub fn tls_info(&self) -> Option<&TlsInfo> {
        self.tls_info
            .get_or_init(|| self.context.tls.clone().map(TlsInfo::new))
            .as_ref()
    }

    /// Peer address
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.context.remote_addr
    }

    /// Local address the request was accepted on
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.context.local_addr
    }

    /// Body chunks. The first call yields the body; later calls yield an
    /// empty stream.
    pub fn body(&self) -> BodyStream {
        let taken = match self.body.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match taken {
            Some(body) => body::into_stream(body),
            None => body::empty_stream(),
        }
    }
}

impl fmt::Debug for ServerHttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHttpRequest")
            .field("id", &self.context.request_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
