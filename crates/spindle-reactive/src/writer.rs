//! Native response writer
//!
//! [`StreamingResponse::new`] splits a response into a writer half, driven by
//! the response adapter, and a [`PendingResponse`] half that resolves to the
//! `http::Response` handed back to the engine once the head is known. Body
//! frames flow through a bounded channel, so a slow peer applies backpressure
//! to `write_data`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::{future, stream, SinkExt, StreamExt};
use http::{HeaderMap, Response, StatusCode};
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use spindle_core::body::{self, Body};
use spindle_core::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Frames buffered between the writer and the engine
const BODY_BUFFER: usize = 2;

/// Status line and headers of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// Response status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// A head with no headers
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }
}

/// Push-based writer for one response.
///
/// The head must be written before any data. After `close` or `close_with`
/// the writer is no longer open and further writes fail.
#[async_trait]
pub trait HttpResponseWriter: Send {
    /// Send the status line and headers
    async fn write_headers(&mut self, head: ResponseHead) -> Result<()>;

    /// Send a body chunk
    async fn write_data(&mut self, data: Bytes) -> Result<()>;

    /// Finish the response normally
    async fn close(&mut self) -> Result<()>;

    /// Abort the response with an error
    async fn close_with(&mut self, error: Error) -> Result<()>;

    /// Whether the writer still accepts writes
    fn is_open(&self) -> bool;
}

type FrameSender = mpsc::Sender<Result<Frame<Bytes>>>;

/// Constructor for a writer and its pending response
#[derive(Debug)]
pub struct StreamingResponse;

impl StreamingResponse {
    /// Create a connected writer / pending response pair
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (StreamingWriter, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        (
            StreamingWriter {
                head: Some(head_tx),
                body: None,
                finished: Arc::new(AtomicBool::new(false)),
            },
            PendingResponse { head: head_rx },
        )
    }
}

/// Writer half feeding a [`PendingResponse`]
pub struct StreamingWriter {
    head: Option<oneshot::Sender<Response<Body>>>,
    body: Option<FrameSender>,
    finished: Arc<AtomicBool>,
}

impl StreamingWriter {
    fn send_response(&mut self, response: Response<Body>) -> Result<()> {
        let head = self
            .head
            .take()
            .ok_or_else(|| Error::Internal("response head already sent".to_string()))?;
        head.send(response).map_err(|_| Error::ConnectionClosed)
    }

    fn status_only(status: StatusCode) -> Response<Body> {
        let mut response = Response::new(body::empty());
        *response.status_mut() = status;
        response
    }
}

#[async_trait]
impl HttpResponseWriter for StreamingWriter {
    async fn write_headers(&mut self, head: ResponseHead) -> Result<()> {
        let (tx, rx) = mpsc::channel(BODY_BUFFER);
        // The channel closing without `close` ends the body with an error
        let finished = Arc::clone(&self.finished);
        let trailer = stream::once(async move {
            (!finished.load(Ordering::Acquire)).then_some(Err(Error::ConnectionClosed))
        })
        .filter_map(future::ready);
        let frames = rx.chain(trailer);
        let mut response = Response::new(StreamBody::new(frames).boxed_unsync());
        *response.status_mut() = head.status;
        *response.headers_mut() = head.headers;

        self.send_response(response)?;
        self.body = Some(tx);
        Ok(())
    }

    async fn write_data(&mut self, data: Bytes) -> Result<()> {
        let Some(tx) = self.body.as_mut() else {
            return Err(if self.head.is_some() {
                Error::Internal("response data written before headers".to_string())
            } else {
                Error::ConnectionClosed
            });
        };

        if tx.send(Ok(Frame::data(data))).await.is_err() {
            self.body = None;
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.head.is_some() {
            self.send_response(Self::status_only(StatusCode::OK))?;
        }
        if let Some(mut tx) = self.body.take() {
            self.finished.store(true, Ordering::Release);
            let _ = tx.close().await;
        }
        Ok(())
    }

    async fn close_with(&mut self, error: Error) -> Result<()> {
        if self.head.is_some() {
            let status = error.to_status_code();
            debug!(error = %error, status = status.as_u16(), "Response failed before headers");
            return self.send_response(Self::status_only(status));
        }

        match self.body.take() {
            Some(mut tx) => {
                // An error frame makes the engine abort the message
                let _ = tx.send(Err(error)).await;
                Ok(())
            }
            None => Err(Error::ConnectionClosed),
        }
    }

    fn is_open(&self) -> bool {
        match (&self.head, &self.body) {
            (Some(head), _) => !head.is_closed(),
            (None, Some(tx)) => !tx.is_closed(),
            (None, None) => false,
        }
    }
}

impl Drop for StreamingWriter {
    fn drop(&mut self) {
        if let Some(head) = self.head.take() {
            let _ = head.send(Self::status_only(StatusCode::INTERNAL_SERVER_ERROR));
        }
    }
}

impl fmt::Debug for StreamingWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingWriter")
            .field("head_sent", &self.head.is_none())
            .field("open", &self.is_open())
            .finish()
    }
}

/// Response whose head is produced by a [`StreamingWriter`]
#[derive(Debug)]
pub struct PendingResponse {
    head: oneshot::Receiver<Response<Body>>,
}

impl PendingResponse {
    /// Wait for the head; the body keeps streaming afterwards
    pub async fn into_response(self) -> Response<Body> {
        match self.head.await {
            Ok(response) => response,
            Err(_) => StreamingWriter::status_only(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_head_then_data() {
        let (mut writer, pending) = StreamingResponse::new();
        assert!(writer.is_open());

        let mut head = ResponseHead::new(StatusCode::CREATED);
        head.headers
            .insert("x-test", http::HeaderValue::from_static("1"));
        writer.write_headers(head).await.unwrap();

        let response = pending.into_response().await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-test"], "1");

        let writes = tokio::spawn(async move {
            writer.write_data(Bytes::from("he")).await.unwrap();
            writer.write_data(Bytes::from("llo")).await.unwrap();
            writer.close().await.unwrap();
            assert!(!writer.is_open());
        });

        let body = body::collect(response.into_body()).await.unwrap();
        assert_eq!(body, Bytes::from("hello"));
        writes.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_with_before_head_maps_status() {
        let (mut writer, pending) = StreamingResponse::new();
        writer
            .close_with(Error::Status(StatusCode::BAD_REQUEST))
            .await
            .unwrap();
        assert!(!writer.is_open());

        let response = pending.into_response().await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_close_with_after_head_aborts_body() {
        let (mut writer, pending) = StreamingResponse::new();
        writer
            .write_headers(ResponseHead::new(StatusCode::OK))
            .await
            .unwrap();
        let response = pending.into_response().await;

        tokio::spawn(async move {
            writer.write_data(Bytes::from("partial")).await.unwrap();
            writer
                .close_with(Error::Internal("boom".to_string()))
                .await
                .unwrap();
        });

        assert!(body::collect(response.into_body()).await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_writer_yields_500() {
        let (writer, pending) = StreamingResponse::new();
        drop(writer);
        let response = pending.into_response().await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_dropped_writer_after_head_aborts_body() {
        let (mut writer, pending) = StreamingResponse::new();
        writer
            .write_headers(ResponseHead::new(StatusCode::OK))
            .await
            .unwrap();
        let response = pending.into_response().await;

        tokio::spawn(async move {
            writer.write_data(Bytes::from("partial")).await.unwrap();
            drop(writer);
        });

        assert!(body::collect(response.into_body()).await.is_err());
    }

    #[tokio::test]
    async fn test_data_before_head_fails() {
        let (mut writer, _pending) = StreamingResponse::new();
        let result = writer.write_data(Bytes::from("x")).await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn test_peer_gone() {
        let (mut writer, pending) = StreamingResponse::new();
        drop(pending);
        assert!(!writer.is_open());
        let result = writer.write_headers(ResponseHead::new(StatusCode::OK)).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }
}
