//! Response builder and utilities

use crate::body::{self, Body};
use crate::Result;
use bytes::Bytes;
use http::{header, Response, StatusCode};
use serde::Serialize;

/// Response builder for convenient response construction
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(header::HeaderName, String)>,
}

impl ResponseBuilder {
    /// Create a new response builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Set a header
    pub fn header(mut self, name: header::HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn finish(self, content_type: Option<&'static str>, body: Body) -> Result<Response<Body>> {
        let mut response = Response::builder().status(self.status);

        if let Some(content_type) = content_type {
            response = response.header(header::CONTENT_TYPE, content_type);
        }

        for (name, value) in self.headers {
            response = response.header(name, value);
        }

        Ok(response.body(body)?)
    }

    /// Build response with empty body
    pub fn build(self) -> Result<Response<Body>> {
        self.finish(None, body::empty())
    }

    /// Build response with text body
    pub fn text(self, text: impl Into<String>) -> Result<Response<Body>> {
        self.finish(Some("text/plain; charset=utf-8"), body::full(text.into()))
    }

    /// Build response with raw bytes
    pub fn bytes(self, data: impl Into<Bytes>) -> Result<Response<Body>> {
        self.finish(Some("application/octet-stream"), body::full(data.into()))
    }

    /// Build response with JSON body
    pub fn json_body<T: Serialize>(self, value: &T) -> Result<Response<Body>> {
        let json = serde_json::to_vec(value)?;
        self.finish(Some("application/json"), body::full(json))
    }
}

/// Convenience functions for common responses
pub mod responses {
    use super::*;

    /// 200 OK
    pub fn ok() -> ResponseBuilder {
        ResponseBuilder::new(StatusCode::OK)
    }

    /// 204 No Content
    pub fn no_content() -> Result<Response<Body>> {
        ResponseBuilder::new(StatusCode::NO_CONTENT).build()
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Result<Response<Body>> {
        ResponseBuilder::new(StatusCode::BAD_REQUEST).text(message)
    }

    /// Plain-text response with an arbitrary status
    pub fn status(status: StatusCode, message: impl Into<String>) -> Result<Response<Body>> {
        ResponseBuilder::new(status).text(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_response_builder() {
        let response = ResponseBuilder::new(StatusCode::OK)
            .header(header::HeaderName::from_static("x-custom"), "value")
            .text("Hello, World!")
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-custom").unwrap(), "value");
        let body = body::collect(response.into_body()).await.unwrap();
        assert_eq!(body, Bytes::from("Hello, World!"));
    }

    #[test]
    fn test_json_response() {
        let data = serde_json::json!({ "message": "success" });

        let response = responses::ok().json_body(&data).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_no_content() {
        let response = responses::no_content().unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
