//! Catch-all dispatch
//!
//! Every request, whatever its path or method, enters through
//! [`Dispatcher::dispatch`]. The decorator chain runs first; the final link
//! hands the request to an [`HttpHandlerAdapter`] on its own task and
//! resolves as soon as the adapter commits a response head.

use http::{Request, Response};
use spindle_core::body::Body;
use spindle_core::middleware::{HandlerFn, Next};
use spindle_core::response::responses;
use spindle_core::{Middleware, RequestContext};
use spindle_reactive::{HttpHandler, HttpHandlerAdapter, StreamingResponse};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Decrements the in-flight count when the handler task ends
struct InFlightGuard {
    count: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self {
            count: Arc::clone(count),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Single entry point for all requests
#[derive(Clone)]
pub struct Dispatcher {
    chain: Arc<[Arc<dyn Middleware>]>,
    handler: Arc<HandlerFn>,
    in_flight: Arc<AtomicUsize>,
}

impl Dispatcher {
    /// Create a dispatcher running `decorators` in order around `handler`
    pub fn new(handler: Arc<dyn HttpHandler>, decorators: Vec<Arc<dyn Middleware>>) -> Self {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let adapter = HttpHandlerAdapter::new(handler);
        let counter = Arc::clone(&in_flight);

        let handler: HandlerFn = Box::new(move |mut req: Request<Body>| {
            let adapter = adapter.clone();
            let guard = InFlightGuard::enter(&counter);
            Box::pin(async move {
                let context = req
                    .extensions_mut()
                    .remove::<RequestContext>()
                    .unwrap_or_default();
                let (writer, pending) = StreamingResponse::new();

                tokio::spawn(async move {
                    let _guard = guard;
                    adapter.handle(context, req, Box::new(writer)).await;
                });

                Ok(pending.into_response().await)
            })
        });

        Self {
            chain: Arc::from(decorators),
            handler: Arc::new(handler),
            in_flight,
        }
    }

    /// Number of handler tasks still running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Number of decorators around the handler
    pub fn decorator_count(&self) -> usize {
        self.chain.len()
    }

    /// Route a request through the decorators to the handler
    pub async fn dispatch(&self, context: RequestContext, mut req: Request<Body>) -> Response<Body> {
        let request_id = context.request_id.clone();
        req.extensions_mut().insert(context);

        let next = Next::with_shared_handler(Arc::clone(&self.chain), Arc::clone(&self.handler));
        match next.run(req).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(request_id = %request_id, error = %err, "Request dispatch failed");
                let status = err.to_status_code();
                responses::status(status, format!("Error: {}", err)).unwrap_or_else(|_| {
                    let mut response = Response::new(spindle_core::body::empty());
                    *response.status_mut() = status;
                    response
                })
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("decorators", &self.chain)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
