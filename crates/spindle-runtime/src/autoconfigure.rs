//! Server auto-configuration

use crate::factory::{ReactiveWebServerFactory, ServletWebServerFactory};
use crate::trace::{HttpTracingService, Sampler};
use spindle_config::{Config, ServerSettings};
use spindle_core::Result;
use std::sync::Arc;

/// Kind of web application being hosted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebApplicationType {
    /// Non-blocking handler over a streaming engine
    #[default]
    Reactive,
    /// Blocking servlet-style container
    Servlet,
}

/// Factory chosen for an application type
#[derive(Debug)]
pub enum WebServerFactory {
    /// Reactive server factory
    Reactive(ReactiveWebServerFactory),
    /// Servlet server factory
    Servlet(ServletWebServerFactory),
}

/// Select the server factory for an application type
pub fn web_server_factory(
    application_type: WebApplicationType,
    settings: ServerSettings,
) -> Result<WebServerFactory> {
    match application_type {
        WebApplicationType::Reactive => Ok(WebServerFactory::Reactive(
            ReactiveWebServerFactory::new(settings),
        )),
        WebApplicationType::Servlet => ServletWebServerFactory::new().map(WebServerFactory::Servlet),
    }
}

/// Reactive factory for a loaded configuration, with the tracing decorator
/// installed when tracing is enabled
pub fn configure(config: &Config) -> ReactiveWebServerFactory {
    let factory = ReactiveWebServerFactory::new(config.server.clone());

    let tracing_config = &config.observability.tracing;
    if !tracing_config.enabled {
        return factory;
    }

    tracing::info!(
        service = %tracing_config.service_name,
        sample_rate = tracing_config.sample_rate,
        "HTTP tracing enabled"
    );
    let service = HttpTracingService::new(tracing_config.service_name.clone())
        .with_sampler(Sampler::rate(tracing_config.sample_rate));
    factory.with_decorator(Arc::new(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_config::ConfigBuilder;
    use spindle_core::Error;

    #[test]
    fn test_reactive_factory() {
        let settings = ServerSettings {
            port: 0,
            ..Default::default()
        };
        match web_server_factory(WebApplicationType::Reactive, settings).unwrap() {
            WebServerFactory::Reactive(factory) => assert_eq!(factory.settings().port, 0),
            other => panic!("unexpected factory: {:?}", other),
        }
    }

    #[test]
    fn test_servlet_factory_fails() {
        let err = web_server_factory(WebApplicationType::Servlet, ServerSettings::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)));
    }

    #[test]
    fn test_configure_installs_tracing() {
        let config = ConfigBuilder::new().port(0).build().unwrap();
        assert_eq!(configure(&config).decorator_count(), 0);

        let config = ConfigBuilder::new()
            .port(0)
            .tracing("orders", 0.5)
            .build()
            .unwrap();
        assert_eq!(configure(&config).decorator_count(), 1);
    }
}
