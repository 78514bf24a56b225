//! # Spindle Reactive
//!
//! Adapters between a push-based streaming HTTP engine and a reactive
//! request/response handler contract:
//! - [`ServerHttpRequest`] exposes the inbound request with translated
//!   headers, lazily parsed cookies and TLS details, and a single-pass body
//! - [`ServerHttpResponse`] collects status, headers and cookies, then
//!   forwards head, body chunks and completion to a native writer
//! - [`HttpHandlerAdapter`] wires both to an [`HttpHandler`] per request

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod adapter;
pub mod handler;
pub mod request;
pub mod response;
pub mod writer;

#[cfg(test)]
mod testing;

pub use adapter::HttpHandlerAdapter;
pub use handler::HttpHandler;
pub use request::{ServerHttpRequest, TlsInfo};
pub use response::{ResponseState, ServerHttpResponse};
pub use writer::{
    HttpResponseWriter, PendingResponse, ResponseHead, StreamingResponse, StreamingWriter,
};
