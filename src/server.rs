use crate::config::ServerConfig;
use crate::request::{self, ParseOutcome, Request};
use crate::response::Response;
use crate::router::Router;
use crate::{EchoError, Result};
use bytes::{Buf, BytesMut};
use http::StatusCode;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::{signal, time::timeout};
use tracing::{Instrument, error, info, warn};

/// HTTP echo server
///
/// Accepts connections on a TCP listener and serves HTTP/1.1 requests through
/// an explicit [`Router`]. Each connection runs in its own tokio task; there
/// is no state shared between requests.
///
/// # Examples
///
/// ```no_run
/// use httpecho::{EchoServer, Router, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = EchoServer::new(ServerConfig::default(), Router::with_echo());
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct EchoServer {
    config: ServerConfig,
    router: Arc<Router>,
    shutdown_signal: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl EchoServer {
    /// Creates a server from a configuration and a route table
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let (shutdown_signal, _) = tokio::sync::broadcast::channel(1);
        Self {
            config,
            router: Arc::new(router),
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    /// Binds to the configured address and serves until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serves connections from an already-bound listener until shutdown.
    ///
    /// Useful when the caller needs the listener's local address, e.g. after
    /// binding to port 0.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(address = %listener.local_addr()?, "HTTP echo server listening");

        let connection_count = Arc::new(AtomicUsize::new(0));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current_count = connection_count.load(Ordering::SeqCst);
                            if current_count >= self.config.max_connections {
                                warn!(%addr, current = current_count, limit = self.config.max_connections, "Connection rejected: limit reached");
                                continue;
                            }

                            connection_count.fetch_add(1, Ordering::SeqCst);
                            let new_count = connection_count.load(Ordering::SeqCst);
                            info!(%addr, current = new_count, "Accepted connection");

                            let config = self.config.clone();
                            let router = self.router.clone();
                            let connection_count = connection_count.clone();
                            let span = tracing::info_span!("connection", %addr, current = new_count);

                            tokio::spawn(async move {
                                let result = Self::handle_connection(stream, addr, config, router).instrument(span).await;
                                if let Err(e) = result {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let final_count = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                info!(%addr, current = final_count, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("HTTP echo server stopped");
        Ok(())
    }

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    pub fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }

    /// Serves HTTP requests on a single connection until the client closes
    /// it, asks for close, times out, or sends something unparseable
    async fn handle_connection(
        mut stream: TcpStream,
        addr: SocketAddr,
        config: ServerConfig,
        router: Arc<Router>,
    ) -> Result<()> {
        let mut buffer = BytesMut::with_capacity(config.buffer_size);
        let mut read_buf = vec![0u8; config.buffer_size];

        loop {
            let request = match Self::read_request(&mut stream, &mut buffer, &mut read_buf, &config, addr).await? {
                Some(request) => request,
                None => break,
            };

            info!(%addr, method = %request.method, path = %request.path, body_len = request.body.len(), "Received request");

            let keep_alive = request.keep_alive();
            let mut response = router.dispatch(request).await;
            if let Some(name) = &config.server_name {
                response = response.with_header("Server", name);
            }
            if !keep_alive {
                response = response.with_header("Connection", "close");
            }

            if !Self::write_response(&mut stream, &response, &config, addr).await? {
                break;
            }
            info!(%addr, status = response.status.as_u16(), "Sent response");

            if !keep_alive {
                break;
            }
        }

        Ok(())
    }

    /// Reads until one full request is buffered and parses it.
    ///
    /// Returns `Ok(None)` when the connection should close without a further
    /// response: clean EOF between requests, read timeout, or a malformed
    /// request that was already answered with a 400.
    async fn read_request(
        stream: &mut TcpStream,
        buffer: &mut BytesMut,
        read_buf: &mut [u8],
        config: &ServerConfig,
        addr: SocketAddr,
    ) -> Result<Option<Request>> {
        loop {
            match request::parse(buffer) {
                Ok(ParseOutcome::Complete(request, consumed)) => {
                    buffer.advance(consumed);
                    return Ok(Some(request));
                }
                Ok(ParseOutcome::Partial) => {}
                Err(e) => {
                    warn!(%addr, error = %e, "Rejecting malformed request");
                    let response = Response::text(StatusCode::BAD_REQUEST, e.to_string())
                        .with_header("Connection", "close");
                    Self::write_response(stream, &response, config, addr).await?;
                    return Ok(None);
                }
            }

            let read_result = timeout(config.read_timeout, stream.read(read_buf)).await;
            let n = match read_result {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(%addr, "Read timeout");
                    return Ok(None);
                }
            };

            if n == 0 {
                if buffer.is_empty() {
                    info!(%addr, "Client closed connection");
                    return Ok(None);
                }
                // EOF in the middle of a request
                return Err(EchoError::IncompleteRequest);
            }

            buffer.extend_from_slice(&read_buf[..n]);
        }
    }

    /// Writes a serialized response; returns false on write timeout
    async fn write_response(
        stream: &mut TcpStream,
        response: &Response,
        config: &ServerConfig,
        addr: SocketAddr,
    ) -> Result<bool> {
        let wire = response.to_bytes();
        let write_result = timeout(config.write_timeout, async {
            stream.write_all(&wire).await?;
            stream.flush().await
        })
        .await;

        match write_result {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                warn!(%addr, "Write timeout");
                Ok(false)
            }
        }
    }
}
