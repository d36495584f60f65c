//! Native HTTP server implementation
//!
//! hyper HTTP/1.1 on tokio:
//! - socket2 listener with SO_REUSEADDR / SO_REUSEPORT / TCP_NODELAY
//! - one task per connection
//! - graceful shutdown that drains open connections

use crate::{App, Error, Method, Request, Response, Result, ServerConfig, StatusCode};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Create a TCP socket with optimizations
pub fn create_optimized_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // SO_REUSEPORT - enable kernel load balancing across threads
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    socket.set_nonblocking(true)?;
    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;

    Ok(socket)
}

/// Convert a hyper request into our [`Request`], reading at most
/// `max_body_size` bytes of body
pub async fn from_hyper_request<B>(req: hyper::Request<B>, max_body_size: usize) -> Result<Request>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let method: Method = parts.method.as_str().parse()?;

    let mut request = Request::new(method, parts.uri.path());
    request.query = parts.uri.query().map(str::to_string);

    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    let collected = Limited::new(body, max_body_size).collect().await.map_err(|e| {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            Error::BodyTooLarge {
                size: request.content_length().unwrap_or(max_body_size + 1),
                limit: max_body_size,
            }
        } else {
            Error::Hyper(e.to_string())
        }
    })?;
    request.body = collected.to_bytes();

    Ok(request)
}

/// Convert our Response to hyper Response
///
/// Headers that are not valid HTTP are dropped.
pub fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut out = hyper::Response::new(Full::new(res.body));
    *out.status_mut() = http::StatusCode::from_u16(res.status.as_u16())
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in &res.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                out.headers_mut().append(name, value);
            }
            _ => debug!(header = %name, "dropping invalid response header"),
        }
    }

    out
}

/// Tracks active connections for graceful shutdown
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicU64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a new connection until the returned guard drops
    pub fn track(self: &Arc<Self>) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Get current active connection count
    #[inline]
    pub fn count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Decrements the tracker when dropped
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.tracker.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// HTTP server for an [`App`]
pub struct Server {
    app: Arc<App>,
    config: ServerConfig,
    tracker: Arc<ConnectionTracker>,
}

impl Server {
    pub fn new(app: App, config: ServerConfig) -> Self {
        Self {
            app: Arc::new(app),
            config,
            tracker: Arc::new(ConnectionTracker::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn connections(&self) -> u64 {
        self.tracker.count()
    }

    /// Bind the configured address; must be called inside a tokio runtime
    pub fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.socket_addr()?;
        let socket = create_optimized_socket(&addr)?;
        Ok(TcpListener::from_std(socket.into())?)
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = self.bind()?;
        self.serve(listener, shutdown).await
    }

    /// Accept connections on `listener` until `shutdown` resolves, then wait
    /// up to the configured grace period for open connections to finish
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        info!(port = addr.port(), "server is up and running on port {}", addr.port());

        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%peer, error = %e, "could not set TCP_NODELAY");
                    }
                    self.spawn_connection(stream, peer, stop_rx.clone());
                }
                _ = &mut shutdown => break,
            }
        }

        info!(active = self.tracker.count(), "shutting down");
        drop(listener);
        let _ = stop_tx.send(true);

        let deadline = tokio::time::Instant::now() + self.config.shutdown_grace;
        while self.tracker.count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        if self.tracker.count() > 0 {
            warn!(active = self.tracker.count(), "connections still open after grace period");
        }

        info!("server stopped");
        Ok(())
    }

    fn spawn_connection(
        &self,
        stream: tokio::net::TcpStream,
        peer: SocketAddr,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        let app = Arc::clone(&self.app);
        let max_body_size = self.config.max_body_size;
        let guard = self.tracker.track();

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let app = Arc::clone(&app);
                async move { Ok::<_, Infallible>(handle_request(&app, req, max_body_size).await) }
            });

            let conn = http1::Builder::new().serve_connection(io, service);
            tokio::pin!(conn);

            let result = tokio::select! {
                res = conn.as_mut() => res,
                _ = stop_rx.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            };

            if let Err(e) = result {
                if !e.is_incomplete_message() {
                    debug!(%peer, error = %e, "connection error");
                }
            }
            drop(guard);
        });
    }
}

/// Handle one hyper request
async fn handle_request(
    app: &App,
    req: hyper::Request<hyper::body::Incoming>,
    max_body_size: usize,
) -> hyper::Response<Full<Bytes>> {
    let request = match from_hyper_request(req, max_body_size).await {
        Ok(request) => request,
        Err(e @ Error::BodyTooLarge { .. }) => {
            debug!(error = %e, "rejecting request");
            return to_hyper_response(Response::new(StatusCode::PAYLOAD_TOO_LARGE));
        }
        Err(e @ Error::InvalidMethod(_)) => {
            debug!(error = %e, "no routes for method");
            return to_hyper_response(Response::not_found());
        }
        Err(e) => {
            debug!(error = %e, "could not read request");
            return to_hyper_response(Response::bad_request());
        }
    };

    to_hyper_response(app.handle(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseBuilder;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn test_to_hyper_response() {
        let res = ResponseBuilder::new(StatusCode::CREATED)
            .header("content-type", "application/json")
            .header("bad header", "x")
            .body("{}")
            .build();

        let out = to_hyper_response(res);
        assert_eq!(out.status(), http::StatusCode::CREATED);
        assert_eq!(out.headers()["content-type"], "application/json");
        assert_eq!(out.headers().len(), 1);
    }

    #[tokio::test]
    async fn test_from_hyper_request() {
        let req = hyper::Request::builder()
            .method("PATCH")
            .uri("/fruits/1?dry=1")
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from_static(br#"{"count":30}"#)))
            .unwrap();

        let req = from_hyper_request(req, 1024).await.unwrap();
        assert_eq!(req.method, Method::Patch);
        assert_eq!(req.path, "/fruits/1");
        assert_eq!(req.query.as_deref(), Some("dry=1"));
        assert!(req.is_json());
        assert_eq!(&req.body[..], br#"{"count":30}"#);
    }

    #[tokio::test]
    async fn test_from_hyper_request_limits_body() {
        let req = hyper::Request::builder()
            .method("POST")
            .uri("/fruits")
            .body(Full::new(Bytes::from(vec![b'x'; 64])))
            .unwrap();

        let err = from_hyper_request(req, 16).await.unwrap_err();
        assert!(matches!(err, Error::BodyTooLarge { limit: 16, .. }));
    }

    #[tokio::test]
    async fn test_unknown_method_rejected() {
        let req = hyper::Request::builder()
            .method("PURGE")
            .uri("/fruits")
            .body(Full::new(Bytes::new()))
            .unwrap();

        assert!(matches!(
            from_hyper_request(req, 16).await,
            Err(Error::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_connection_guard() {
        let tracker = Arc::new(ConnectionTracker::new());
        let a = tracker.track();
        let b = tracker.track();
        assert_eq!(tracker.count(), 2);
        drop(a);
        assert_eq!(tracker.count(), 1);
        drop(b);
        assert_eq!(tracker.count(), 0);
    }

    async fn raw_request(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_serves_over_tcp() {
        let config = ServerConfig::new(0)
            .hostname("127.0.0.1")
            .shutdown_grace(Duration::from_secs(1));
        let server = Arc::new(Server::new(App::seeded().unwrap(), config));
        let listener = server.bind().unwrap();
        let addr = listener.local_addr().unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn({
            let server = Arc::clone(&server);
            async move {
                server
                    .serve(listener, async {
                        let _ = rx.await;
                    })
                    .await
            }
        });

        let res = raw_request(
            addr,
            "GET /fruits HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n",
        )
        .await;
        assert!(res.starts_with("HTTP/1.1 200 OK\r\n"), "{res}");
        assert!(res.contains(r#"{"id":1,"name":"apple","count":20}"#), "{res}");

        let body = r#"{"name":"kiwi","count":5}"#;
        let res = raw_request(
            addr,
            &format!(
                "POST /fruits HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
                body.len(),
                body
            ),
        )
        .await;
        assert!(res.starts_with("HTTP/1.1 201 Created\r\n"), "{res}");
        assert!(res.ends_with(r#"{"name":"kiwi","count":5,"id":4}"#), "{res}");

        let res = raw_request(addr, "POST /blah HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n").await;
        assert!(res.starts_with("HTTP/1.1 404 Not Found\r\n"), "{res}");

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(server.connections(), 0);
    }
}
