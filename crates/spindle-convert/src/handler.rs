//! Handler that converts returned values into responses

use crate::builtin::builtin_converters;
use crate::converter::{AnyResult, ConverterChain, ExceptionHandler};
use crate::exception::DefaultExceptionHandler;
use crate::observable::Observable;
use crate::provider::{find_converter, ObservableConverterProvider, ResponseConverterProvider};
use async_trait::async_trait;
use futures::future::BoxFuture;
use http::Response;
use spindle_core::body::{self, Body};
use spindle_core::{HeaderCollection, Result};
use spindle_reactive::{HttpHandler, ServerHttpRequest, ServerHttpResponse};
use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type Service = dyn Fn(ServerHttpRequest) -> BoxFuture<'static, Result<AnyResult>> + Send + Sync;

/// Default converters: observables first, then the built-in value converters
pub fn default_converters(exception: Arc<dyn ExceptionHandler>) -> ConverterChain {
    let general = builtin_converters();
    let providers: [Arc<dyn ResponseConverterProvider>; 1] = [Arc::new(ObservableConverterProvider)];

    let mut chain = ConverterChain::new();
    if let Some(observable) =
        find_converter(&providers, TypeId::of::<Observable>(), &general, exception)
    {
        chain = chain.with(observable);
    }
    chain.with(Arc::new(general))
}

/// Runs a service returning an arbitrary value and renders that value with a
/// converter chain
pub struct ConvertingHandler {
    service: Arc<Service>,
    converters: ConverterChain,
    exception: Arc<dyn ExceptionHandler>,
}

impl ConvertingHandler {
    /// Wrap `service` with the default converters and exception handler
    pub fn new<F, Fut>(service: F) -> Self
    where
        F: Fn(ServerHttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<AnyResult>> + Send + 'static,
    {
        let exception: Arc<dyn ExceptionHandler> = Arc::new(DefaultExceptionHandler);
        Self {
            service: Arc::new(move |request| -> BoxFuture<'static, Result<AnyResult>> {
                Box::pin(service(request))
            }),
            converters: default_converters(Arc::clone(&exception)),
            exception,
        }
    }

    /// Use a different converter chain
    pub fn with_converters(mut self, converters: ConverterChain) -> Self {
        self.converters = converters;
        self
    }

    /// Use a different exception handler for service failures
    pub fn with_exception_handler(mut self, exception: Arc<dyn ExceptionHandler>) -> Self {
        self.exception = exception;
        self
    }

    async fn render(&self, request: ServerHttpRequest) -> Response<Body> {
        let ctx = request.context().clone();
        let value = match (self.service)(request).await {
            Ok(value) => value,
            Err(err) => return self.exception.handle_exception(&ctx, err),
        };

        let converted = match self.converters.convert(&ctx, value) {
            Ok(response) => response.await,
            Err(err) => Err(err),
        };
        converted.unwrap_or_else(|err| self.exception.handle_exception(&ctx, err))
    }
}

impl fmt::Debug for ConvertingHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertingHandler")
            .field("converters", &self.converters)
            .field("exception", &self.exception)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpHandler for ConvertingHandler {
    async fn handle(&self, request: ServerHttpRequest, response: &mut ServerHttpResponse) -> Result<()> {
        let (parts, body) = self.render(request).await.into_parts();

        response.set_status_code(parts.status);
        let headers = response.headers_mut()?;
        for (name, values) in HeaderCollection::from_header_map(&parts.headers).iter() {
            headers.add_all(name, values.to_vec());
        }

        response.write_with(body::into_stream(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Request, StatusCode};
    use spindle_core::{Error, RequestContext};
    use spindle_reactive::{HttpHandlerAdapter, StreamingResponse};

    async fn serve(handler: ConvertingHandler, uri: &str) -> Response<Body> {
        let adapter = HttpHandlerAdapter::new(Arc::new(handler));
        let (writer, pending) = StreamingResponse::new();
        let request = Request::builder().uri(uri).body(body::empty()).unwrap();
        tokio::spawn(async move {
            adapter
                .handle(RequestContext::new(), request, Box::new(writer))
                .await;
        });
        pending.into_response().await
    }

    #[tokio::test]
    async fn test_string_result() {
        let handler = ConvertingHandler::new(|request: ServerHttpRequest| {
            let path = request.path().to_string();
            async move { Ok::<AnyResult, Error>(Box::new(path)) }
        });

        let response = serve(handler, "/greeting").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(body::collect(response.into_body()).await.unwrap(), "/greeting");
    }

    #[tokio::test]
    async fn test_observable_result() {
        let handler = ConvertingHandler::new(|_request| async {
            Ok::<AnyResult, Error>(Box::new(Observable::from_items([serde_json::json!({"n": 1})])))
        });

        let response = serve(handler, "/").await;
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body::collect(response.into_body()).await.unwrap(), r#"{"n":1}"#);
    }

    #[tokio::test]
    async fn test_service_error() {
        let handler = ConvertingHandler::new(|_request| async {
            Err::<AnyResult, _>(Error::Status(StatusCode::NOT_FOUND))
        });

        let response = serve(handler, "/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
