//! # Spindle Core
//!
//! Core types, traits, and error handling for Spindle.
//!
//! This crate provides the foundational abstractions shared by the adapter
//! and runtime crates:
//! - Error types
//! - Header and cookie translation
//! - Request context and TLS session snapshot
//! - Streaming body aliases and response builders
//! - Decorator chain

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod body;
pub mod context;
pub mod cookie;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod response;

pub use body::{Body, BodyStream};
pub use context::{RequestContext, TlsSession};
pub use cookie::{Cookie, CookieMap, MaxAge, ResponseCookie};
pub use error::{Error, Result};
pub use headers::HeaderCollection;
pub use middleware::{Middleware, Next};
pub use response::ResponseBuilder;

// Re-export commonly used HTTP types
pub use bytes::Bytes;
pub use http::{Method, Request, Response, StatusCode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::body::{Body, BodyStream};
    pub use crate::context::{RequestContext, TlsSession};
    pub use crate::cookie::{Cookie, CookieMap, MaxAge, ResponseCookie};
    pub use crate::error::{Error, Result};
    pub use crate::headers::HeaderCollection;
    pub use crate::middleware::{Middleware, Next};
    pub use crate::response::ResponseBuilder;
}
