//! Sample handlers

use async_trait::async_trait;
use http::StatusCode;
use spindle_core::{Error, Result};
use spindle_reactive::{HttpHandler, ServerHttpRequest, ServerHttpResponse};

/// Echoes the request body back, copying the request content type
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

#[async_trait]
impl HttpHandler for EchoHandler {
    async fn handle(&self, request: ServerHttpRequest, response: &mut ServerHttpResponse) -> Result<()> {
        if let Some(content_type) = request.headers().get_first("content-type") {
            response
                .headers_mut()?
                .set("content-type", content_type.to_string());
        }
        response.write_with(request.body()).await
    }
}

/// Fails every request with `400 Bad Request` before writing anything
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFailureHandler;

#[async_trait]
impl HttpHandler for AlwaysFailureHandler {
    async fn handle(&self, _request: ServerHttpRequest, _response: &mut ServerHttpResponse) -> Result<()> {
        Err(Error::Status(StatusCode::BAD_REQUEST))
    }
}

/// Writes a fixed list of chunks, one at a time
#[derive(Debug, Clone, Default)]
pub struct ChunkedHandler {
    chunks: Vec<&'static str>,
}

impl ChunkedHandler {
    /// Handler writing `chunks` in order
    pub fn new(chunks: Vec<&'static str>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl HttpHandler for ChunkedHandler {
    async fn handle(&self, _request: ServerHttpRequest, response: &mut ServerHttpResponse) -> Result<()> {
        let chunks: Vec<Result<bytes::Bytes>> = self
            .chunks
            .iter()
            .map(|chunk| Ok(bytes::Bytes::from_static(chunk.as_bytes())))
            .collect();
        response
            .write_with(Box::pin(futures::stream::iter(chunks)))
            .await
    }
}
