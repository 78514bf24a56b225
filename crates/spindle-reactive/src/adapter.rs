//! Bridges native requests to an [`HttpHandler`]

use crate::handler::HttpHandler;
use crate::request::ServerHttpRequest;
use crate::response::ServerHttpResponse;
use crate::writer::{HttpResponseWriter, ResponseHead};
use http::{Request, StatusCode};
use spindle_core::body::Body;
use spindle_core::RequestContext;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Builds the request/response adapter pair for each request and runs the
/// handler against it
#[derive(Clone)]
pub struct HttpHandlerAdapter {
    handler: Arc<dyn HttpHandler>,
}

impl HttpHandlerAdapter {
    /// Wrap a handler
    pub fn new(handler: Arc<dyn HttpHandler>) -> Self {
        Self { handler }
    }

    /// Handle one request, writing the outcome through `writer`.
    ///
    /// A malformed request target is answered with `400 Bad Request` without
    /// invoking the handler. Otherwise the response is completed with the
    /// handler's error, if any.
    pub async fn handle(
        &self,
        context: RequestContext,
        request: Request<Body>,
        mut writer: Box<dyn HttpResponseWriter>,
    ) {
        let start = Instant::now();
        let request_id = context.request_id.clone();
        let method = request.method().clone();

        let request = match ServerHttpRequest::new(context, request) {
            Ok(request) => request,
            Err(err) => {
                warn!(
                    request_id = %request_id,
                    method = %method,
                    error = %err,
                    "Rejecting request with malformed target"
                );
                if writer
                    .write_headers(ResponseHead::new(StatusCode::BAD_REQUEST))
                    .await
                    .is_ok()
                {
                    let _ = writer.close().await;
                }
                return;
            }
        };

        let path = request.path().to_string();
        let mut response = ServerHttpResponse::new(writer);

        match self.handler.handle(request, &mut response).await {
            Ok(()) => response.set_complete(None).await,
            Err(err) => {
                debug!(
                    request_id = %request_id,
                    error = %err,
                    "Handler failed"
                );
                response.set_complete(Some(err)).await;
            }
        }

        debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = ?response.status_code(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
    }
}

impl fmt::Debug for HttpHandlerAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandlerAdapter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::MockHttpHandler;
    use crate::testing::{RecordingWriter, WriterEvent};
    use async_trait::async_trait;
    use spindle_core::body;
    use spindle_core::{Error, Result};

    fn request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_target_never_reaches_handler() {
        let mut handler = MockHttpHandler::new();
        handler.expect_handle().never();

        let adapter = HttpHandlerAdapter::new(Arc::new(handler));
        let writer = RecordingWriter::new();
        adapter
            .handle(RequestContext::new(), request("/hello%"), Box::new(writer.clone()))
            .await;

        let heads = writer.heads();
        assert_eq!(heads.len(), 1);
        assert_eq!(heads[0].status, StatusCode::BAD_REQUEST);
        assert_eq!(writer.events().last(), Some(&WriterEvent::Close));
    }

    #[tokio::test]
    async fn test_handler_ok_completes() {
        let mut handler = MockHttpHandler::new();
        handler
            .expect_handle()
            .times(1)
            .returning(|_request, response| {
                response.set_status_code(StatusCode::NO_CONTENT);
                Ok(())
            });

        let adapter = HttpHandlerAdapter::new(Arc::new(handler));
        let writer = RecordingWriter::new();
        adapter
            .handle(RequestContext::new(), request("/ok"), Box::new(writer.clone()))
            .await;

        assert_eq!(writer.heads()[0].status, StatusCode::NO_CONTENT);
        assert_eq!(writer.count(|e| *e == WriterEvent::Close), 1);
    }

    #[tokio::test]
    async fn test_handler_error_aborts() {
        let mut handler = MockHttpHandler::new();
        handler
            .expect_handle()
            .times(1)
            .returning(|_request, _response| Err(Error::Status(StatusCode::BAD_REQUEST)));

        let adapter = HttpHandlerAdapter::new(Arc::new(handler));
        let writer = RecordingWriter::new();
        adapter
            .handle(RequestContext::new(), request("/fail"), Box::new(writer.clone()))
            .await;

        assert!(writer.heads().is_empty());
        assert_eq!(writer.count(|e| matches!(e, WriterEvent::CloseWith(_))), 1);
        assert_eq!(writer.count(|e| *e == WriterEvent::Close), 0);
    }

    struct Echo;

    #[async_trait]
    impl HttpHandler for Echo {
        async fn handle(
            &self,
            request: ServerHttpRequest,
            response: &mut ServerHttpResponse,
        ) -> Result<()> {
            if let Some(content_type) = request.headers().get_first("content-type") {
                response
                    .headers_mut()?
                    .set("content-type", content_type.to_string());
            }
            response.write_with(request.body()).await
        }
    }

    #[tokio::test]
    async fn test_echo_body() {
        let adapter = HttpHandlerAdapter::new(Arc::new(Echo));
        let writer = RecordingWriter::new();
        let req = Request::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "text/plain")
            .body(body::full("hello"))
            .unwrap();
        adapter
            .handle(RequestContext::new(), req, Box::new(writer.clone()))
            .await;

        let head = &writer.heads()[0];
        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(head.headers["content-type"], "text/plain");
        assert_eq!(writer.body(), b"hello");
        assert_eq!(writer.count(|e| *e == WriterEvent::Close), 1);
    }
}
