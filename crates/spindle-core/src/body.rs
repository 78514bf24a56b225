//! Body type aliases and conversions

use crate::{Error, Result};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full};

/// Streaming body used for both requests and responses
pub type Body = UnsyncBoxBody<Bytes, Error>;

/// Single-pass stream of body chunks
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// An empty body
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A body holding one chunk
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Wrap an engine request body
pub fn from_incoming(incoming: hyper::body::Incoming) -> Body {
    incoming.map_err(Error::from).boxed_unsync()
}

/// Turn a body into a stream of its data chunks, skipping trailers
pub fn into_stream(body: Body) -> BodyStream {
    body.into_data_stream().boxed()
}

/// A stream with no chunks
pub fn empty_stream() -> BodyStream {
    futures::stream::empty().boxed()
}

/// Collect a body into contiguous bytes
pub async fn collect(body: Body) -> Result<Bytes> {
    Ok(body.collect().await?.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_full_body_stream() {
        let chunks: Vec<Bytes> = into_stream(full("hello")).try_collect().await.unwrap();
        assert_eq!(chunks, vec![Bytes::from("hello")]);
    }

    #[tokio::test]
    async fn test_empty_body() {
        assert!(collect(empty()).await.unwrap().is_empty());
        assert_eq!(empty_stream().count().await, 0);
    }
}
