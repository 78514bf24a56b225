//! Outbound response adapter

use crate::writer::{HttpResponseWriter, ResponseHead};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use http::header::{HeaderValue, SET_COOKIE};
use http::{HeaderMap, StatusCode};
use spindle_core::body::BodyStream;
use spindle_core::cookie::{encode_set_cookie, CookieMap, ResponseCookie};
use spindle_core::{Error, HeaderCollection, Result};
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    /// Status, headers and cookies are still mutable
    Init,
    /// The head has been handed to the writer
    HeaderSent,
    /// Terminal; nothing more is written
    Complete,
}

/// Mutable view of an outbound response, forwarding to a native writer.
///
/// Not shareable between tasks: every operation takes `&mut self`.
pub struct ServerHttpResponse {
    writer: Box<dyn HttpResponseWriter>,
    state: ResponseState,
    status: Option<StatusCode>,
    headers: HeaderCollection,
    cookies: CookieMap<ResponseCookie>,
}

impl ServerHttpResponse {
    /// Wrap a native writer
    pub fn new(writer: Box<dyn HttpResponseWriter>) -> Self {
        Self {
            writer,
            state: ResponseState::Init,
            status: None,
            headers: HeaderCollection::new(),
            cookies: CookieMap::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ResponseState {
        self.state
    }

    /// Whether the head has been sent
    pub fn is_committed(&self) -> bool {
        self.state != ResponseState::Init
    }

    /// Set the status; returns `false` once the head has been sent
    pub fn set_status_code(&mut self, status: StatusCode) -> bool {
        if self.is_committed() {
            return false;
        }
        self.status = Some(status);
        true
    }

    /// Explicitly set status, if any
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    /// Mutable response headers, available until the head is sent
    pub fn headers_mut(&mut self) -> Result<&mut HeaderCollection> {
        if self.is_committed() {
            return Err(Error::HeadersCommitted);
        }
        Ok(&mut self.headers)
    }

    /// Queue a cookie for a `Set-Cookie` header
    pub fn add_cookie(&mut self, cookie: ResponseCookie) -> Result<()> {
        if self.is_committed() {
            return Err(Error::HeadersCommitted);
        }
        self.cookies.add(cookie.name().to_string(), cookie);
        Ok(())
    }

    /// Queued cookies
    pub fn cookies(&self) -> &CookieMap<ResponseCookie> {
        &self.cookies
    }

    fn apply_status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    fn apply_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        self.headers.append_to(headers)
    }

    fn apply_cookies(&self, headers: &mut HeaderMap) -> Result<()> {
        for cookie in self.cookies.values() {
            let encoded = encode_set_cookie(cookie)?;
            let value = HeaderValue::from_str(&encoded)
                .map_err(|e| Error::cookie_encoding(cookie.name(), e.to_string()))?;
            headers.append(SET_COOKIE, value);
        }
        Ok(())
    }

    fn build_head(&self) -> Result<ResponseHead> {
        let mut head = ResponseHead::new(self.apply_status_code());
        self.apply_headers(&mut head.headers)?;
        self.apply_cookies(&mut head.headers)?;
        Ok(head)
    }

    /// Send the head once; later calls are no-ops
    pub async fn send_headers(&mut self) -> Result<()> {
        match self.state {
            ResponseState::Init => {}
            ResponseState::HeaderSent => return Ok(()),
            ResponseState::Complete => return Err(Error::ResponseComplete),
        }

        let head = self.build_head()?;
        if let Err(err) = self.writer.write_headers(head).await {
            self.state = ResponseState::Complete;
            return Err(err);
        }
        self.state = ResponseState::HeaderSent;
        Ok(())
    }

    async fn write_data(&mut self, data: Bytes) -> Result<()> {
        self.send_headers().await?;
        if let Err(err) = self.writer.write_data(data).await {
            self.state = ResponseState::Complete;
            return Err(err);
        }
        Ok(())
    }

    async fn forward(&mut self, mut body: BodyStream) -> Result<()> {
        if self.state == ResponseState::Complete {
            return Err(Error::ResponseComplete);
        }

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(data) => self.write_data(data).await?,
                Err(err) => {
                    warn!(error = %err, "Response body stream failed");
                    self.set_complete(Some(Error::Status(err.to_status_code())))
                        .await;
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Write every chunk of `body`, then complete the response
    pub async fn write_with(&mut self, body: BodyStream) -> Result<()> {
        self.forward(body).await?;
        self.set_complete(None).await;
        Ok(())
    }

    /// Write each inner stream in order without completing between them,
    /// then complete the response once
    pub async fn write_and_flush_with(
        &mut self,
        mut bodies: BoxStream<'static, BodyStream>,
    ) -> Result<()> {
        while let Some(body) = bodies.next().await {
            self.forward(body).await?;
        }
        self.set_complete(None).await;
        Ok(())
    }

    /// Finish the response. Idempotent.
    ///
    /// With an error the writer is aborted; without one the head is sent if
    /// it has not been yet and the writer is closed. If the writer is already
    /// closed the response becomes complete without signalling it again.
    pub async fn set_complete(&mut self, error: Option<Error>) {
        if self.state == ResponseState::Complete {
            return;
        }

        if !self.writer.is_open() {
            debug!("Writer already closed, completing response");
            self.state = ResponseState::Complete;
            return;
        }

        let result = match error {
            Some(err) => self.writer.close_with(err).await,
            None => match self.send_headers().await {
                Ok(()) => self.writer.close().await,
                Err(err) if self.state == ResponseState::Init => {
                    warn!(error = %err, "Failed to send response headers");
                    self.writer.close_with(err).await
                }
                Err(err) => Err(err),
            },
        };

        if let Err(err) = result {
            debug!(error = %err, "Failed to close response writer");
        }
        self.state = ResponseState::Complete;
    }
}

impl fmt::Debug for ServerHttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHttpResponse")
            .field("state", &self.state)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies.len())
            .finish_non_exhaustive()
    }
}
