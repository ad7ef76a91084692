use crate::core::errors::ExchangeError;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument, trace};

pub const SUBSCRIBE: &str = "SUBSCRIBE";
pub const UNSUBSCRIBE: &str = "UNSUBSCRIBE";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Input from which a [`StreamHandler`] derives its endpoint and channels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub use_ssl: bool,
    /// Host and path of the stream endpoint, without scheme
    pub name: String,
    pub symbols: Vec<String>,
    pub service: String,
}

impl StreamConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            use_ssl: true,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_symbols(mut self, symbols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// `wss` or `ws` depending on `use_ssl`
    pub const fn scheme(&self) -> &'static str {
        if self.use_ssl {
            "wss"
        } else {
            "ws"
        }
    }
}

/// Capabilities a concrete stream type supplies to [`start_subscribe`]
///
/// `on_message` and `on_error` run on the session's receive task, in arrival
/// order. A slow handler delays every later frame, and a handler that never
/// returns stalls the session.
pub trait StreamHandler: Send + Sync + 'static {
    /// Full URL to dial, including scheme
    fn endpoint(&self, config: &StreamConfig) -> String;

    /// Channel names for the subscribe handshake
    fn channels(&self, config: &StreamConfig) -> Vec<String>;

    /// Called at most once, when the receive loop hits a connection or protocol error
    fn on_error(&self, error: ExchangeError);

    /// Called with the payload of every text or binary frame
    fn on_message(&self, frame: &[u8]);
}

/// JSON control frame sent to subscribe or unsubscribe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub method: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    pub id: i64,
}

impl SubscriptionRequest {
    pub fn subscribe(channels: &[String]) -> Self {
        Self::new(SUBSCRIBE, channels)
    }

    pub fn unsubscribe(channels: &[String]) -> Self {
        Self::new(UNSUBSCRIBE, channels)
    }

    fn new(method: &str, channels: &[String]) -> Self {
        Self {
            method: method.to_string(),
            params: channels.to_vec(),
            id: unix_seconds(),
        }
    }

    pub fn to_message(&self) -> Result<Message, ExchangeError> {
        Ok(Message::Text(serde_json::to_string(self)?))
    }
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Lifecycle of a [`StreamSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Subscribing,
    Streaming,
    Draining,
    Closed,
}

/// One live streaming connection and its receive task
///
/// Call [`StreamSession::shutdown`] to unsubscribe and close. Dropping the
/// session also stops the receive task and releases the connection, but
/// without the unsubscribe handshake.
pub struct StreamSession {
    sink: Arc<Mutex<WsSink>>,
    channels: Vec<String>,
    quit: watch::Sender<bool>,
    state: Arc<watch::Sender<SessionState>>,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("channels", &self.channels)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Dial, subscribe and start delivering frames to `handler`.
///
/// The subscribe frame is written before the receive task starts, so no
/// inbound frame is handled ahead of it. The handshake is not acknowledged;
/// the venue's reply arrives through `on_message` like any other frame.
/// If sending the handshake fails the connection is closed before the error
/// is returned.
#[instrument(skip(handler, config), fields(name = %config.name))]
pub async fn start_subscribe<H>(
    handler: Arc<H>,
    config: &StreamConfig,
) -> Result<StreamSession, ExchangeError>
where
    H: StreamHandler + ?Sized,
{
    let endpoint = handler.endpoint(config);

    let (stream, _) = connect_async(endpoint.as_str()).await?;
    debug!(%endpoint, "stream connected");

    subscribe_on(stream, handler, config).await
}

async fn subscribe_on<H>(
    stream: WsStream,
    handler: Arc<H>,
    config: &StreamConfig,
) -> Result<StreamSession, ExchangeError>
where
    H: StreamHandler + ?Sized,
{
    let state = Arc::new(watch::channel(SessionState::Connecting).0);
    let (sink, source) = stream.split();
    let (quit, quit_rx) = watch::channel(false);
    state.send_replace(SessionState::Subscribing);

    let mut session = StreamSession {
        sink: Arc::new(Mutex::new(sink)),
        channels: Vec::new(),
        quit,
        state,
    };

    let channels = handler.channels(config);
    if !channels.is_empty() {
        let sent = match SubscriptionRequest::subscribe(&channels).to_message() {
            Ok(frame) => session.send(frame).await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            session.close_connection().await;
            return Err(e);
        }
        debug!(?channels, "subscribe sent");
        session.channels = channels;
    }

    session.state.send_replace(SessionState::Streaming);
    tokio::spawn(receive_loop(
        handler,
        source,
        Arc::clone(&session.sink),
        quit_rx,
        Arc::clone(&session.state),
    ));

    Ok(session)
}

impl StreamSession {
    /// Channels sent in the subscribe handshake
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Stop the receive loop, unsubscribe, and close the connection.
    ///
    /// The connection is closed even when the unsubscribe frame cannot be
    /// sent; that send error is what gets returned.
    #[instrument(skip(self), fields(channels = self.channels.len()))]
    pub async fn shutdown(self) -> Result<(), ExchangeError> {
        self.state.send_replace(SessionState::Draining);
        // Fails only when the loop has already exited.
        let _ = self.quit.send(true);

        let unsubscribed = if self.channels.is_empty() {
            Ok(())
        } else {
            match SubscriptionRequest::unsubscribe(&self.channels).to_message() {
                Ok(frame) => self.send(frame).await,
                Err(e) => Err(e),
            }
        };

        self.close_connection().await;
        self.state.send_replace(SessionState::Closed);
        unsubscribed
    }

    async fn send(&self, frame: Message) -> Result<(), ExchangeError> {
        self.sink.lock().await.send(frame).await?;
        Ok(())
    }

    async fn close_connection(&self) {
        if let Err(e) = self.sink.lock().await.close().await {
            debug!("close after error or peer close: {}", e);
        }
    }
}

async fn receive_loop<H>(
    handler: Arc<H>,
    mut source: WsSource,
    sink: Arc<Mutex<WsSink>>,
    mut quit: watch::Receiver<bool>,
    state: Arc<watch::Sender<SessionState>>,
) where
    H: StreamHandler + ?Sized,
{
    let error = loop {
        if *quit.borrow() {
            trace!("receive loop stopped");
            return;
        }

        let frame = tokio::select! {
            biased;
            changed = quit.changed() => {
                // Session dropped without shutdown.
                if changed.is_err() {
                    return;
                }
                continue;
            }
            frame = source.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => handler.on_message(text.as_bytes()),
            Some(Ok(Message::Binary(data))) => handler.on_message(&data),
            Some(Ok(Message::Ping(_))) => {
                trace!("ping received");
                if let Err(e) = sink.lock().await.send(Message::Pong(Vec::new())).await {
                    break ExchangeError::from(e);
                }
            }
            Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                let reason = frame.map_or_else(
                    || "closed by peer".to_string(),
                    |f| format!("closed by peer: {} {}", f.code, f.reason),
                );
                break ExchangeError::ConnectionClosed(reason);
            }
            Some(Err(e)) => break ExchangeError::from(e),
            None => break ExchangeError::ConnectionClosed("stream ended".to_string()),
        }
    };

    debug!("receive loop failed: {}", error);
    state.send_replace(SessionState::Closed);
    handler.on_error(error);
}
