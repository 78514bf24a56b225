//! Cookie codec.
//!
//! Request `Cookie` headers are decoded leniently: segments that do not form a
//! `name=value` pair with a token name are dropped instead of failing the
//! request. `Set-Cookie` values are encoded strictly and any violation is
//! reported as [`Error::CookieEncoding`].

use crate::{Error, Result};
use chrono::{TimeDelta, Utc};
use std::fmt;

/// A request cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Cookie lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxAge {
    /// Discarded when the user agent session ends
    #[default]
    Session,
    /// Expires after the given number of seconds (0 deletes the cookie)
    Seconds(u64),
}

/// A cookie to be sent in a `Set-Cookie` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCookie {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    max_age: MaxAge,
    http_only: bool,
    secure: bool,
}

impl ResponseCookie {
    /// Create a session cookie with no attributes
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            max_age: MaxAge::Session,
            http_only: false,
            secure: false,
        }
    }

    /// Set the `Domain` attribute
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the `Path` attribute
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the `Max-Age` attribute
    pub fn max_age(mut self, max_age: MaxAge) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the `HttpOnly` flag
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the `Secure` flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// `Domain` attribute
    pub fn get_domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// `Path` attribute
    pub fn get_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// `Max-Age` attribute
    pub fn get_max_age(&self) -> MaxAge {
        self.max_age
    }

    /// `HttpOnly` flag
    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    /// `Secure` flag
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

/// Ordered multimap of cookies keyed by (case-sensitive) name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieMap<C = Cookie> {
    entries: Vec<(String, Vec<C>)>,
}

impl<C> Default for CookieMap<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C> CookieMap<C> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cookie under a name
    pub fn add(&mut self, name: impl Into<String>, cookie: C) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, cookies)) => cookies.push(cookie),
            None => self.entries.push((name, vec![cookie])),
        }
    }

    /// First cookie with a name
    pub fn get_first(&self, name: &str) -> Option<&C> {
        self.get_all(name).first()
    }

    /// All cookies with a name
    pub fn get_all(&self, name: &str) -> &[C] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cookies)| cookies.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every cookie in insertion order, flattened
    pub fn values(&self) -> impl Iterator<Item = &C> {
        self.entries.iter().flat_map(|(_, cookies)| cookies.iter())
    }
}

/// Decode a single `Cookie` request header value.
///
/// Never fails. Segments without `=`, with an empty or non-token name, or
/// with a `$`-prefixed (RFC 2965 attribute) name are skipped.
pub fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header.split(';').filter_map(parse_pair).collect()
}

fn parse_pair(segment: &str) -> Option<Cookie> {
    let (name, value) = segment.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() || name.starts_with('$') || !name.bytes().all(is_token_char) {
        return None;
    }
    Some(Cookie::new(name, strip_quotes(value.trim())))
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Encode a cookie as a `Set-Cookie` header value, validating every part.
pub fn encode_set_cookie(cookie: &ResponseCookie) -> Result<String> {
    let name = cookie.name();
    if name.is_empty() {
        return Err(Error::cookie_encoding(name, "empty cookie name"));
    }
    if let Some(bad) = name.bytes().find(|b| !is_token_char(*b)) {
        return Err(Error::cookie_encoding(
            name,
            format!("illegal character {:?} in name", bad as char),
        ));
    }

    let unquoted = strip_quotes(cookie.value());
    if let Some(bad) = unquoted.bytes().find(|b| !is_cookie_octet(*b)) {
        return Err(Error::cookie_encoding(
            name,
            format!("illegal character {:?} in value", bad as char),
        ));
    }

    let mut encoded = format!("{}={}", name, cookie.value());

    if let MaxAge::Seconds(secs) = cookie.get_max_age() {
        encoded.push_str(&format!("; Max-Age={secs}"));
        let expires = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        if let Some(expires) = expires {
            encoded.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
    }

    if let Some(path) = cookie.get_path() {
        validate_attribute(name, "Path", path)?;
        encoded.push_str("; Path=");
        encoded.push_str(path);
    }

    if let Some(domain) = cookie.get_domain() {
        validate_attribute(name, "Domain", domain)?;
        encoded.push_str("; Domain=");
        encoded.push_str(domain);
    }

    if cookie.is_secure() {
        encoded.push_str("; Secure");
    }

    if cookie.is_http_only() {
        encoded.push_str("; HttpOnly");
    }

    Ok(encoded)
}

fn validate_attribute(name: &str, attribute: &str, value: &str) -> Result<()> {
    match value.bytes().find(|b| *b == b';' || b.is_ascii_control()) {
        Some(bad) => Err(Error::cookie_encoding(
            name,
            format!("illegal character {:?} in {attribute}", bad as char),
        )),
        None => Ok(()),
    }
}

// RFC 7230 tchar
fn is_token_char(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
        | b'^' | b'_' | b'`' | b'|' | b'~')
        || b.is_ascii_alphanumeric()
}

// RFC 6265 cookie-octet
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}
