//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jsonrpc_relay::config::RelayConfig;
use jsonrpc_relay::net::listener::Listener;
use jsonrpc_relay::{RelayServer, Shutdown, UpstreamClient};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    /// Lower-cased header names.
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Requests received by a mock backend, in arrival order.
pub type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

/// Start a programmable mock JSON-RPC backend on an ephemeral port.
///
/// `f` receives each request body and returns the status and JSON body to
/// answer with.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Captured)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = captured.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let _ = serve_one(socket, f, log).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, captured)
}

/// Start a mock backend that always answers 200 with `body`.
pub async fn start_mock_backend(body: &'static str) -> (SocketAddr, Captured) {
    start_programmable_backend(move |_| async move { (200, body.to_string()) }).await
}

async fn serve_one<F, Fut>(socket: TcpStream, f: Arc<F>, log: Captured) -> std::io::Result<()>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = (u16, String)>,
{
    let mut reader = BufReader::new(socket);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    let body = String::from_utf8_lossy(&body).into_owned();

    log.lock().unwrap().push(CapturedRequest {
        request_line: request_line.trim().to_string(),
        headers,
        body: body.clone(),
    });

    let (status, response) = f(body).await;
    let response_str = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nX-Backend: mock\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        response.len(),
        response
    );

    let mut socket = reader.into_inner();
    socket.write_all(response_str.as_bytes()).await?;
    socket.shutdown().await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    Ok(())
}

/// Relay configuration pointing at a plain-http upstream on `upstream`.
pub fn relay_config(upstream: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1".into();
    config.listener.bind_port = 0;
    config.upstream.address = upstream.ip().to_string();
    config.upstream.port = upstream.port();
    config.upstream.scheme = "http".into();
    config.session.cooldown_ms = 0;
    config
}

/// Start a relay in the background; returns its address and shutdown handle.
pub async fn start_relay(config: RelayConfig) -> (SocketAddr, Shutdown) {
    let upstream = UpstreamClient::from_config(&config.upstream).unwrap();
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let server = RelayServer::new(&config, upstream);
        server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Frame a JSON body as an inbound relay request.
pub fn post(body: &str) -> String {
    format!(
        "POST / HTTP/1.1\r\nHost: relay.local\r\nAuthorization: Basic dXNlcjpwYXNz\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
}

/// A response frame read back from the relay.
#[derive(Debug)]
pub struct RelayResponse {
    pub status_line: String,
    pub status: u16,
    /// Headers in received order.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RelayResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Read one response frame. Returns `None` if the relay closed the
/// connection before sending a status line.
pub async fn read_response<R>(reader: &mut BufReader<R>) -> Option<RelayResponse>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut status_line = String::new();
    if reader.read_line(&mut status_line).await.ok()? == 0 {
        return None;
    }
    let status_line = status_line.trim_end().to_string();
    let status = status_line.split_whitespace().nth(1)?.parse().ok()?;

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(": ")?;
        headers.push((name.to_string(), value.to_string()));
    }

    let length: usize = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse().ok())?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.ok()?;

    Some(RelayResponse {
        status_line,
        status,
        headers,
        body: String::from_utf8(body).ok()?,
    })
}

/// True once the peer has closed the connection within `limit` without
/// sending anything. A reset counts as closed: the relay may close with
/// unread request bytes still queued.
pub async fn closed_within<R>(reader: &mut BufReader<R>, limit: Duration) -> bool
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut rest = Vec::new();
    match tokio::time::timeout(limit, reader.read_to_end(&mut rest)).await {
        Ok(Ok(0)) => true,
        Ok(Err(e)) => e.kind() == std::io::ErrorKind::ConnectionReset && rest.is_empty(),
        _ => false,
    }
}
