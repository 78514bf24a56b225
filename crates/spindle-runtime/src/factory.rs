//! Web server factories

use crate::dispatch::Dispatcher;
use crate::server::WebServer;
use spindle_config::ServerSettings;
use spindle_core::{Error, Middleware, Result};
use spindle_reactive::HttpHandler;
use spindle_tls::TlsAcceptor;
use std::sync::Arc;

/// Builds [`WebServer`]s serving a reactive [`HttpHandler`]
#[derive(Debug, Clone)]
pub struct ReactiveWebServerFactory {
    settings: ServerSettings,
    decorators: Vec<Arc<dyn Middleware>>,
}

impl ReactiveWebServerFactory {
    /// Create a factory for the given settings
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings,
            decorators: Vec::new(),
        }
    }

    /// Add a decorator around the catch-all dispatch. Decorators run in the
    /// order they were added.
    pub fn with_decorator(mut self, decorator: Arc<dyn Middleware>) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Number of decorators installed
    pub fn decorator_count(&self) -> usize {
        self.decorators.len()
    }

    /// Server settings
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Create a server for `handler`.
    ///
    /// TLS material is loaded and validated here, so bad key stores, trust
    /// stores, protocol or cipher names fail before anything is bound.
    pub fn get_web_server(&self, handler: Arc<dyn HttpHandler>) -> Result<WebServer> {
        let tls = match self.settings.tls() {
            Some(ssl) => {
                let acceptor = TlsAcceptor::new(ssl).map_err(|e| {
                    tracing::error!(error = %e, "Failed to initialize TLS");
                    e
                })?;
                tracing::info!(
                    self_signed = acceptor.is_self_signed(),
                    client_auth = ?ssl.client_auth,
                    "HTTPS enabled"
                );
                Some(acceptor)
            }
            None => None,
        };

        if !self.settings.http2.enabled {
            tracing::warn!("HTTP/2 cannot be disabled; it is negotiated per connection");
        }
        if self.settings.compression.enabled {
            tracing::warn!(
                mime_types = ?self.settings.compression.mime_types,
                "Response compression is not supported and will be ignored"
            );
        }

        let dispatcher = Dispatcher::new(handler, self.decorators.clone());
        Ok(WebServer::new(self.settings.clone(), dispatcher, tls))
    }
}

/// Placeholder for a blocking servlet-style server
#[derive(Debug)]
pub struct ServletWebServerFactory {
    _private: (),
}

impl ServletWebServerFactory {
    /// Always fails: servlet containers are not supported
    pub fn new() -> Result<Self> {
        Err(Error::NotImplemented(
            "Not implemented yet. Are you interested in sending a PR?".to_string(),
        ))
    }
}
