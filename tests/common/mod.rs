#![allow(dead_code)]

use async_trait::async_trait;
use dapix::core::kernel::{HttpClient, HttpTransport};
use dapix::{ExchangeConfig, ExchangeError};
use futures_util::{SinkExt, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, Response};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const TEST_API_KEY: &str = "test_api_key";
pub const TEST_SECRET_KEY: &str = "test_secret_key";

static TRACING: OnceLock<()> = OnceLock::new();

/// Install a subscriber once per test binary; `RUST_LOG` overrides the level.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn short_timeout() -> Duration {
    Duration::from_secs(5)
}

pub fn create_test_config() -> ExchangeConfig {
    ExchangeConfig::new(TEST_API_KEY.to_string(), TEST_SECRET_KEY.to_string())
}

/// What the transport saw for one request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub has_body: bool,
}

/// Transport that records every request and answers with a canned response
#[derive(Debug)]
pub struct RecordingTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    status: u16,
    body: String,
}

impl RecordingTransport {
    pub fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            status,
            body: body.into(),
        })
    }

    pub fn ok(body: impl Into<String>) -> Arc<Self> {
        Self::new(200, body)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests()
            .pop()
            .expect("transport received no request")
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: Request) -> Result<Response, ExchangeError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method().clone(),
            url: request.url().to_string(),
            headers: request.headers().clone(),
            has_body: request.body().is_some(),
        });

        let response = http::Response::builder()
            .status(self.status)
            .header("content-type", "application/json")
            .body(self.body.clone())
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;
        Ok(Response::from(response))
    }
}

/// Transport whose every call fails at the network layer
#[derive(Debug, Default)]
pub struct FailingTransport;

#[async_trait]
impl HttpTransport for FailingTransport {
    async fn send(&self, _request: Request) -> Result<Response, ExchangeError> {
        Err(ExchangeError::NetworkError("connection reset".to_string()))
    }
}

pub fn recording_client(
    use_ssl: bool,
    transport: &Arc<RecordingTransport>,
) -> HttpClient<Arc<RecordingTransport>> {
    HttpClient::with_transport(TEST_API_KEY, use_ssl, Arc::clone(transport))
}

/// A single-connection websocket venue on localhost
///
/// Frames the client sends show up on `received`; frames pushed into
/// `control` are written to the client. `received` yields `None` once the
/// connection is gone.
pub struct MockVenue {
    pub addr: SocketAddr,
    pub received: mpsc::UnboundedReceiver<Message>,
    pub control: mpsc::UnboundedSender<Message>,
}

impl MockVenue {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received) = mpsc::unbounded_channel();
        let (control, mut control_rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            let (tcp, _peer) = listener.accept().await.unwrap();
            let ws_stream = accept_async(tcp).await.unwrap();
            let (mut sink, mut source) = ws_stream.split();

            loop {
                tokio::select! {
                    outbound = control_rx.recv() => match outbound {
                        Some(message) => {
                            if sink.send(message).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                    inbound = source.next() => match inbound {
                        Some(Ok(message)) => {
                            let _ = received_tx.send(message);
                        }
                        _ => break,
                    },
                }
            }
        });

        Self {
            addr,
            received,
            control,
        }
    }

    /// Host and port, the form `StreamConfig::name` expects
    pub fn name(&self) -> String {
        self.addr.to_string()
    }

    pub fn push(&self, message: Message) {
        self.control.send(message).unwrap();
    }

    /// Next frame from the client, or `None` if the connection ended
    pub async fn next_frame(&mut self) -> Option<Message> {
        timeout(short_timeout(), self.received.recv())
            .await
            .expect("timed out waiting for a client frame")
    }

    /// Next text frame parsed as JSON, skipping control frames
    pub async fn next_json(&mut self) -> serde_json::Value {
        loop {
            match self.next_frame().await {
                Some(Message::Text(text)) => return serde_json::from_str(&text).unwrap(),
                Some(Message::Ping(_) | Message::Pong(_)) => continue,
                other => panic!("expected a text frame, got {:?}", other),
            }
        }
    }
}
