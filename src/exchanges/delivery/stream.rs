use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{StreamConfig, StreamHandler};
use crate::exchanges::delivery::endpoints::{STREAM_HOST, TESTNET_STREAM_HOST};
use crate::exchanges::delivery::events::StreamEvent;
use tokio::sync::mpsc;
use tracing::warn;

pub type EventReceiver = mpsc::UnboundedReceiver<Result<StreamEvent, ExchangeError>>;

/// Market data stream handler that decodes frames into [`StreamEvent`]s
///
/// Channels are `<symbol>@<service>` with the symbol lowercased, e.g.
/// `btcusd_perp@aggTrade`. Decoded events and the terminal connection
/// error are forwarded over the receiver returned by [`MarketStream::new`].
#[derive(Debug, Clone)]
pub struct MarketStream {
    events: mpsc::UnboundedSender<Result<StreamEvent, ExchangeError>>,
}

impl MarketStream {
    pub fn new() -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }

    /// Stream settings for the venue host selected by `config`
    pub fn stream_config(
        config: &ExchangeConfig,
        symbols: impl IntoIterator<Item = impl Into<String>>,
        service: impl Into<String>,
    ) -> StreamConfig {
        let host = if config.testnet {
            TESTNET_STREAM_HOST
        } else {
            STREAM_HOST
        };
        StreamConfig::new(host)
            .with_ssl(config.use_ssl)
            .with_symbols(symbols)
            .with_service(service)
    }

    fn forward(&self, event: Result<StreamEvent, ExchangeError>) {
        if self.events.send(event).is_err() {
            warn!("market stream receiver dropped, discarding event");
        }
    }
}

impl StreamHandler for MarketStream {
    fn endpoint(&self, config: &StreamConfig) -> String {
        format!("{}://{}", config.scheme(), config.name)
    }

    fn channels(&self, config: &StreamConfig) -> Vec<String> {
        config
            .symbols
            .iter()
            .map(|symbol| format!("{}@{}", symbol.to_lowercase(), config.service))
            .collect()
    }

    fn on_error(&self, error: ExchangeError) {
        self.forward(Err(error));
    }

    fn on_message(&self, frame: &[u8]) {
        self.forward(StreamEvent::decode(frame));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_lowercase_symbols() {
        let (stream, _rx) = MarketStream::new();
        let config = StreamConfig::new(STREAM_HOST)
            .with_symbols(["BTCUSD_PERP", "ethusd_perp"])
            .with_service("markPrice");
        assert_eq!(
            stream.channels(&config),
            ["btcusd_perp@markPrice", "ethusd_perp@markPrice"]
        );
    }

    #[test]
    fn test_endpoint_follows_ssl_flag() {
        let (stream, _rx) = MarketStream::new();
        let secure = MarketStream::stream_config(&ExchangeConfig::read_only(), ["x"], "aggTrade");
        assert_eq!(stream.endpoint(&secure), "wss://dstream.binance.com/ws");

        let plain = MarketStream::stream_config(
            &ExchangeConfig::read_only().testnet(true).use_ssl(false),
            ["x"],
            "aggTrade",
        );
        assert_eq!(stream.endpoint(&plain), "ws://dstream.binancefuture.com/ws");
    }

    #[tokio::test]
    async fn test_messages_and_errors_are_forwarded() {
        let (stream, mut rx) = MarketStream::new();
        stream.on_message(br#"{"e":"indexPriceUpdate","E":1,"i":"BTCUSD","p":"9636.5"}"#);
        stream.on_error(ExchangeError::ConnectionClosed("gone".to_string()));

        assert!(matches!(
            rx.recv().await,
            Some(Ok(StreamEvent::IndexPrice(index))) if index.index_price == "9636.5"
        ));
        assert!(matches!(
            rx.recv().await,
            Some(Err(ExchangeError::ConnectionClosed(_)))
        ));
    }
}
