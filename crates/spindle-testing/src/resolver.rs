//! DNS stub for tests

use hyper_util::client::legacy::connect::dns::Name;
use std::future::{ready, Ready};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::task::{Context, Poll};
use std::vec;
use tower::Service;

/// Resolves every host name to the loopback address.
///
/// The connector fills in the port from the request URI, so
/// `http://example.com:<port>/` reaches a server bound on localhost.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyResolver;

impl Service<Name> for DummyResolver {
    type Response = vec::IntoIter<SocketAddr>;
    type Error = io::Error;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, name: Name) -> Self::Future {
        tracing::trace!(host = name.as_str(), "Resolving to loopback");
        ready(Ok(vec![SocketAddr::from((Ipv4Addr::LOCALHOST, 0))].into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_resolves_to_loopback() {
        let name = Name::from_str("example.com").unwrap();
        let addrs: Vec<SocketAddr> = DummyResolver.oneshot(name).await.unwrap().collect();
        assert_eq!(addrs, vec![SocketAddr::from((Ipv4Addr::LOCALHOST, 0))]);
    }
}
