//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use http_forwarder::config::ForwarderConfig;
use http_forwarder::lifecycle::Shutdown;
use http_forwarder::observability::{AuditRecord, AuditSink, LogAuditSink};
use http_forwarder::HttpServer;

/// What the audit sink saw for one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub uri: String,
    pub status: u16,
    pub text: String,
}

/// Audit sink that keeps every record in memory, optionally also passing it
/// on to the process log.
#[derive(Default)]
pub struct CollectingSink {
    records: Mutex<Vec<Captured>>,
    log: Option<LogAuditSink>,
}

impl AuditSink for CollectingSink {
    fn record(&self, record: &AuditRecord<'_>) {
        if let Some(log) = &self.log {
            log.record(record);
        }
        self.records.lock().unwrap().push(Captured {
            method: record.method.to_string(),
            uri: record.uri.to_string(),
            status: record.status_code(),
            text: record.to_string(),
        });
    }
}

impl CollectingSink {
    /// Collect and also write each record through `tracing`.
    pub fn logging() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            log: Some(LogAuditSink),
        }
    }

    pub fn records(&self) -> Vec<Captured> {
        self.records.lock().unwrap().clone()
    }

    /// Wait until at least `count` records exist, then give stragglers a
    /// moment so duplicates would show up.
    pub async fn wait_for(&self, count: usize) -> Vec<Captured> {
        for _ in 0..200 {
            if self.records.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.records()
    }
}

/// A running forwarder.
pub struct Proxy {
    pub addr: SocketAddr,
    pub sink: Arc<CollectingSink>,
    shutdown: Shutdown,
}

impl Proxy {
    pub fn url(&self, target: &str) -> String {
        format!("http://{}{}", self.addr, target)
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the forwarder in front of `base_url` on an ephemeral port.
pub async fn start_proxy(base_url: &str) -> Proxy {
    start_proxy_with_sink(base_url, CollectingSink::default()).await
}

/// Like [`start_proxy`], but audit records also reach the `audit` log target.
pub async fn start_logging_proxy(base_url: &str) -> Proxy {
    start_proxy_with_sink(base_url, CollectingSink::logging()).await
}

async fn start_proxy_with_sink(base_url: &str, sink: CollectingSink) -> Proxy {
    let sink = Arc::new(sink);
    let config = ForwarderConfig::new(base_url, "127.0.0.1:0");
    let server = HttpServer::with_audit_sink(config, sink.clone()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Proxy {
        addr,
        sink,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A request as the mock upstream received it.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub head: String,
    pub body: Vec<u8>,
}

impl ReceivedRequest {
    /// The request line, e.g. `GET /a HTTP/1.1`.
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    /// Values of header `name` in the order they were sent.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.head
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .filter(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim().to_string())
            .collect()
    }
}

async fn read_request<S>(socket: &mut S) -> Option<ReceivedRequest>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut body = buf[head_end + 4..].to_vec();

    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(ReceivedRequest { head, body })
}

/// Start a mock upstream that answers every request with `response` (raw
/// HTTP bytes) and reports what it received.
pub async fn start_raw_backend(
    response: Vec<u8>,
) -> (SocketAddr, mpsc::UnboundedReceiver<ReceivedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let response = Arc::new(response);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let tx = tx.clone();
                    let response = response.clone();
                    tokio::spawn(async move {
                        serve_one(socket, &response, &tx).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

async fn serve_one<S>(
    mut socket: S,
    response: &[u8],
    tx: &mpsc::UnboundedSender<ReceivedRequest>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Some(request) = read_request(&mut socket).await {
        let _ = tx.send(request);
        let _ = socket.write_all(response).await;
    }
    let _ = socket.shutdown().await;
}

/// Mock upstream returning `status` with `body` and `Connection: close`.
pub async fn start_mock_backend(
    status: &str,
    extra_headers: &[(&str, &str)],
    body: &[u8],
) -> (SocketAddr, mpsc::UnboundedReceiver<ReceivedRequest>) {
    let mut response = format!("HTTP/1.1 {}\r\n", status);
    for (name, value) in extra_headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));

    let mut raw = response.into_bytes();
    raw.extend_from_slice(body);
    start_raw_backend(raw).await
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// HTTPS mock upstream whose certificate no client would trust: self-signed,
/// expired in 2000, and issued for `localhost` while the proxy dials an IP.
pub async fn start_untrusted_tls_backend(
    body: &[u8],
) -> (SocketAddr, mpsc::UnboundedReceiver<ReceivedRequest>) {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let mut params = rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    params.not_before = rcgen::date_time_ymd(1999, 1, 1);
    params.not_after = rcgen::date_time_ymd(2000, 1, 1);
    let cert = params.self_signed(&key_pair).unwrap();

    let identity = native_tls::Identity::from_pkcs8(
        cert.pem().as_bytes(),
        key_pair.serialize_pem().as_bytes(),
    )
    .unwrap();
    let acceptor =
        tokio_native_tls::TlsAcceptor::from(native_tls::TlsAcceptor::new(identity).unwrap());

    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let response = Arc::new(response);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let tx = tx.clone();
            let response = response.clone();
            tokio::spawn(async move {
                if let Ok(stream) = acceptor.accept(socket).await {
                    serve_one(stream, &response, &tx).await;
                }
            });
        }
    });

    (addr, rx)
}

/// One captured `tracing` event.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Records every `tracing` event emitted on the current thread.
///
/// `#[tokio::test]` runs the proxy, the mock upstream and the test body on
/// one thread, so everything the forwarder logs lands here.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl LogCapture {
    /// Install as the thread's default subscriber until the guard drops.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events whose message is exactly `message`.
    pub fn with_message(&self, message: &str) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }

    pub fn with_target(&self, target: &str) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.target == target)
            .collect()
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.events.lock().unwrap().push(LogEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.0,
        });
    }
}
