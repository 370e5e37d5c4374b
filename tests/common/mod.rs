//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use rewrite_proxy::config::ProxyConfig;
use rewrite_proxy::http::HttpServer;
use rewrite_proxy::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct RawRequest {
    /// Request line and headers, as received.
    pub head: String,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// `GET /path HTTP/1.1` → `/path`.
    pub fn path(&self) -> &str {
        self.head
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("/")
    }

    pub fn method(&self) -> &str {
        self.head.split_whitespace().next().unwrap_or("")
    }

    /// Lowercased header names and their values.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.head
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Build a raw HTTP/1.1 response with the given extra headers.
pub fn http_response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {}\r\n", status);
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));
    let mut out = out.into_bytes();
    out.extend_from_slice(body);
    out
}

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(RawRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<u8>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        if let Some(request) = read_request(&mut socket).await {
                            let response = f(request).await;
                            let _ = socket.write_all(&response).await;
                            let _ = socket.shutdown().await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<RawRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut body = buf[head_end + 4..].to_vec();
    let request = RawRequest { head, body: Vec::new() };

    let content_length = request
        .header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RawRequest { body, ..request })
}

/// A running proxy bound to an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, target: &str) -> String {
        format!(
            "http://{}/api/proxy?url={}",
            self.addr,
            urlencoding::encode(target)
        )
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the proxy in-process.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}

/// Client that talks to the proxy directly and never follows redirects itself.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
