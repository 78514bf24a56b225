//! # Spindle Testing
//!
//! Support for integration tests against a running server:
//! - [`DummyResolver`] maps every host name to localhost
//! - Plain and TLS test clients
//! - Sample handlers

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod client;
pub mod handlers;
pub mod resolver;

pub use client::{http_client, request, send, send_tls, TestClient};
pub use handlers::{AlwaysFailureHandler, ChunkedHandler, EchoHandler};
pub use resolver::DummyResolver;
