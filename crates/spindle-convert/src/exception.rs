//! Default error responses

use crate::converter::ExceptionHandler;
use http::Response;
use spindle_core::body::{self, Body};
use spindle_core::response::responses;
use spindle_core::{Error, RequestContext};

/// Maps an error to its status code with a short plain-text body.
///
/// Client errors carry the error message; server errors only the reason
/// phrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExceptionHandler;

impl ExceptionHandler for DefaultExceptionHandler {
    fn handle_exception(&self, ctx: &RequestContext, error: Error) -> Response<Body> {
        let status = error.to_status_code();
        let message = if status.is_server_error() {
            tracing::warn!(request_id = %ctx.request_id, error = %error, "Handler result failed");
            status.canonical_reason().unwrap_or("Error").to_string()
        } else {
            tracing::debug!(request_id = %ctx.request_id, error = %error, "Handler result rejected");
            error.to_string()
        };

        responses::status(status, message).unwrap_or_else(|_| {
            let mut response = Response::new(body::empty());
            *response.status_mut() = status;
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[tokio::test]
    async fn test_client_error_keeps_message() {
        let response = DefaultExceptionHandler.handle_exception(
            &RequestContext::new(),
            Error::malformed_target("/a%", "bad escape"),
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let text = body::collect(response.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&text).contains("/a%"));
    }

    #[tokio::test]
    async fn test_server_error_hides_detail() {
        let response = DefaultExceptionHandler
            .handle_exception(&RequestContext::new(), Error::Internal("secret".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body::collect(response.into_body()).await.unwrap();
        assert_eq!(text, "Internal Server Error");
    }
}
