//! HTTP server tracing decorator

use async_trait::async_trait;
use http::{Request, Response};
use spindle_core::body::Body;
use spindle_core::{Middleware, Next, RequestContext, Result};
use tracing::field::Empty;
use tracing::Instrument;

/// Decides which requests get a span
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampler {
    /// Trace every request
    Always,
    /// Trace nothing
    Never,
    /// Trace a fraction of requests, between 0.0 and 1.0
    Rate(f32),
}

impl Sampler {
    /// Sampler for a rate, collapsing the bounds to `Never` and `Always`
    pub fn rate(rate: f32) -> Self {
        if rate >= 1.0 {
            Self::Always
        } else if rate <= 0.0 || rate.is_nan() {
            Self::Never
        } else {
            Self::Rate(rate)
        }
    }

    /// Roll for one request
    pub fn is_sampled(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Rate(rate) => fastrand::f32() < *rate,
        }
    }
}

/// Runs sampled requests inside an `http.server` span.
///
/// The span carries the request name (the RPC method when the context has
/// one, otherwise the HTTP method), the local service name, the path and,
/// once the head is known, the status. A `sr` event marks receipt and a
/// `ss` event marks the response head being sent.
#[derive(Debug, Clone)]
pub struct HttpTracingService {
    service_name: String,
    sampler: Sampler,
}

impl HttpTracingService {
    /// Trace every request for `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            sampler: Sampler::Always,
        }
    }

    /// Use a different sampler
    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Local service name
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

#[async_trait]
impl Middleware for HttpTracingService {
    async fn call(&self, req: Request<Body>, next: Next) -> Result<Response<Body>> {
        if !self.sampler.is_sampled() {
            return next.run(req).await;
        }

        let name = req
            .extensions()
            .get::<RequestContext>()
            .and_then(|ctx| ctx.rpc_method.clone())
            .unwrap_or_else(|| req.method().to_string());

        let span = tracing::info_span!(
            "http.server",
            name = %name,
            service = %self.service_name,
            path = %req.uri().path(),
            status = Empty,
        );

        async move {
            tracing::info!(annotation = "sr", "Request received");

            let result = next.run(req).await;
            let status = match &result {
                Ok(response) => response.status(),
                Err(err) => err.to_status_code(),
            };
            tracing::Span::current().record("status", status.as_u16());

            tracing::info!(annotation = "ss", "Response sent");
            result
        }
        .instrument(span)
        .await
    }
}
