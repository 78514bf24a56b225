//! Web server handle

use crate::dispatch::Dispatcher;
use crate::shutdown::ShutdownSignal;
use crate::RuntimeState;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use spindle_config::ServerSettings;
use spindle_core::body;
use spindle_core::{Error, RequestContext, Result, TlsSession};
use spindle_tls::TlsAcceptor;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// A bound (or bindable) HTTP server.
///
/// Created by [`ReactiveWebServerFactory`](crate::ReactiveWebServerFactory).
/// `start` binds and begins accepting; `stop` stops accepting, drains
/// in-flight requests up to the shutdown timeout and releases the port.
pub struct WebServer {
    settings: ServerSettings,
    dispatcher: Dispatcher,
    tls: Option<TlsAcceptor>,
    state: Arc<RwLock<RuntimeState>>,
    shutdown: ShutdownSignal,
    local_addr: Option<SocketAddr>,
    accept_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for WebServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebServer")
            .field("settings", &self.settings)
            .field("local_addr", &self.local_addr)
            .field("tls", &self.tls.is_some())
            .field("in_flight", &self.dispatcher.in_flight())
            .finish()
    }
}

impl WebServer {
    pub(crate) fn new(
        settings: ServerSettings,
        dispatcher: Dispatcher,
        tls: Option<TlsAcceptor>,
    ) -> Self {
        Self {
            settings,
            dispatcher,
            tls,
            state: Arc::new(RwLock::new(RuntimeState::Initializing)),
            shutdown: ShutdownSignal::new(),
            local_addr: None,
            accept_task: None,
        }
    }

    /// Get the current state
    pub async fn state(&self) -> RuntimeState {
        *self.state.read().await
    }

    /// Bound port after `start`, the configured port before
    pub fn port(&self) -> u16 {
        self.local_addr
            .map(|addr| addr.port())
            .unwrap_or(self.settings.port)
    }

    /// Bound address, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Whether connections are TLS-terminated
    pub fn is_secure(&self) -> bool {
        self.tls.is_some()
    }

    /// Number of requests whose handler is still running
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Get shutdown signal
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Bind the listener and start accepting connections.
    ///
    /// Calling `start` on a running server is a no-op. A stopped server
    /// cannot be restarted.
    pub async fn start(&mut self) -> Result<()> {
        if self.accept_task.is_some() {
            return Ok(());
        }
        if self.shutdown.is_triggered() {
            return Err(Error::Runtime("server has been stopped".to_string()));
        }

        let bind_addr = self.settings.socket_addr();
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| Error::Runtime(format!("Failed to bind to {}: {}", bind_addr, e)))?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            listen = %local_addr,
            tls = self.tls.is_some(),
            "Web server started"
        );

        let task = tokio::spawn(accept_loop(
            listener,
            self.dispatcher.clone(),
            self.tls.clone(),
            self.shutdown.clone(),
            self.shutdown.subscribe(),
        ));

        self.local_addr = Some(local_addr);
        self.accept_task = Some(task);
        *self.state.write().await = RuntimeState::Running;
        Ok(())
    }

    /// Stop accepting, wait for in-flight requests and release the port
    pub async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.accept_task.take() else {
            *self.state.write().await = RuntimeState::Stopped;
            return Ok(());
        };

        *self.state.write().await = RuntimeState::ShuttingDown;
        self.shutdown.trigger();

        if let Err(e) = task.await {
            tracing::error!("Accept loop terminated abnormally: {}", e);
        }

        let shutdown_timeout = self.settings.shutdown_timeout;
        let start = Instant::now();

        tracing::info!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Waiting for in-flight requests to complete"
        );

        loop {
            let active = self.dispatcher.in_flight();

            if active == 0 {
                tracing::info!("All requests completed, shutting down cleanly");
                break;
            }

            if start.elapsed() >= shutdown_timeout {
                tracing::warn!(
                    active_requests = active,
                    "Shutdown timeout reached, forcing shutdown"
                );
                break;
            }

            tracing::debug!(
                active_requests = active,
                elapsed_ms = start.elapsed().as_millis(),
                "Waiting for active requests to complete"
            );

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        *self.state.write().await = RuntimeState::Stopped;

        tracing::info!(
            shutdown_duration_ms = start.elapsed().as_millis(),
            "Web server stopped"
        );
        Ok(())
    }
}

impl Drop for WebServer {
    fn drop(&mut self) {
        // The accept loop owns the listener and exits once signalled
        if self.accept_task.take().is_some() {
            tracing::debug!("Web server dropped while running, signalling shutdown");
            self.shutdown.trigger();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    dispatcher: Dispatcher,
    tls: Option<TlsAcceptor>,
    shutdown: ShutdownSignal,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, remote_addr)) => {
                        tracing::trace!("Accepted connection from {}", remote_addr);

                        let local_addr = match stream.local_addr() {
                            Ok(addr) => addr,
                            Err(e) => {
                                tracing::warn!("Failed to read local address: {}", e);
                                continue;
                            }
                        };
                        let dispatcher = dispatcher.clone();
                        let tls = tls.clone();
                        let conn_shutdown = shutdown.subscribe();

                        tokio::spawn(async move {
                            let peer = Peer { remote_addr, local_addr, tls: None };
                            match tls {
                                Some(acceptor) => match acceptor.accept(stream).await {
                                    Ok((tls_stream, session)) => {
                                        let peer = Peer { tls: Some(Arc::new(session)), ..peer };
                                        serve_connection(tls_stream, peer, dispatcher, conn_shutdown).await;
                                    }
                                    Err(e) => {
                                        tracing::debug!(remote = %remote_addr, "TLS handshake failed: {}", e);
                                    }
                                },
                                None => serve_connection(stream, peer, dispatcher, conn_shutdown).await,
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                    }
                }
            }

            _ = shutdown_rx.recv() => {
                tracing::info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }
}

/// Per-connection addressing shared by every request on it
#[derive(Clone)]
struct Peer {
    remote_addr: SocketAddr,
    local_addr: SocketAddr,
    tls: Option<Arc<TlsSession>>,
}

impl Peer {
    fn context(&self) -> RequestContext {
        let context = RequestContext::new().with_addrs(self.remote_addr, self.local_addr);
        match &self.tls {
            Some(session) => context.with_tls(Arc::clone(session)),
            None => context,
        }
    }
}

async fn serve_connection<IO>(
    io: IO,
    peer: Peer,
    dispatcher: Dispatcher,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let remote_addr = peer.remote_addr;
    let service = service_fn(move |req: hyper::Request<Incoming>| {
        let dispatcher = dispatcher.clone();
        let context = peer.context();
        async move {
            let response = dispatcher
                .dispatch(context, req.map(body::from_incoming))
                .await;
            Ok::<_, Infallible>(response)
        }
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(io), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = shutdown_rx.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    };

    if let Err(e) = result {
        tracing::debug!(remote = %remote_addr, "Connection error: {}", e);
    }
}
