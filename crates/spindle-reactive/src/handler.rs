//! Reactive handler contract

use crate::request::ServerHttpRequest;
use crate::response::ServerHttpResponse;
use async_trait::async_trait;
use spindle_core::Result;

/// Application entry point for every request.
///
/// The handler owns the request and drives the response. Returning `Ok`
/// completes the response normally if the handler has not done so; returning
/// an error aborts it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpHandler: Send + Sync {
    /// Handle one request
    async fn handle(
        &self,
        request: ServerHttpRequest,
        response: &mut ServerHttpResponse,
    ) -> Result<()>;
}
