//! # Spindle Runtime
//!
//! Hosts a reactive [`HttpHandler`](spindle_reactive::HttpHandler) on a
//! streaming HTTP engine:
//! - Server factories (reactive, plus a servlet placeholder)
//! - Catch-all dispatch with decorators
//! - Server lifecycle (start, port discovery, graceful stop)
//! - Shutdown signal handling
//! - HTTP tracing decorator

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod autoconfigure;
pub mod dispatch;
pub mod factory;
pub mod server;
pub mod shutdown;
pub mod trace;

pub use autoconfigure::{configure, web_server_factory, WebApplicationType, WebServerFactory};
pub use dispatch::Dispatcher;
pub use factory::{ReactiveWebServerFactory, ServletWebServerFactory};
pub use server::WebServer;
pub use shutdown::{ShutdownSignal, SignalHandler};
pub use trace::{HttpTracingService, Sampler};

/// Runtime state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Server is initializing
    Initializing,
    /// Server is running
    Running,
    /// Server is shutting down
    ShuttingDown,
    /// Server is stopped
    Stopped,
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::factory::{ReactiveWebServerFactory, ServletWebServerFactory};
    pub use crate::server::WebServer;
    pub use crate::shutdown::{ShutdownSignal, SignalHandler};
    pub use crate::RuntimeState;
}
