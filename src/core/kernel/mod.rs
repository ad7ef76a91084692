//! Transport kernel shared by every venue collaborator
//!
//! The kernel knows how to build, sign and send one HTTP request, and how to
//! keep one streaming subscription alive. It has no endpoint or payload
//! knowledge; those belong to the collaborators in `crate::exchanges`.
//!
//! # Architecture
//!
//! ## Request construction
//! - `RequestMessage`: descriptor populated through `RequestOption`s
//! - `RequestMessage::finalize`: computes headers, signature and URL
//!
//! ## Authentication
//! - `Signer`: pluggable signing interface
//! - `HmacSigner`: HMAC-SHA256 over the canonical query string
//!
//! ## Transport
//! - `HttpClient`: executes descriptors over an `HttpTransport`
//! - `start_subscribe` / `StreamSession`: one streaming connection per session
//!
//! # Examples
//!
//! ## Signed request
//! ```rust,no_run
//! use dapix::core::kernel::*;
//!
//! # async fn example() -> Result<(), dapix::ExchangeError> {
//! let client = HttpClient::new("api_key", true)?;
//! let request = client.request([
//!     set_endpoint("dapi.binance.com/dapi/v1/positionSide/dual"),
//!     set_method("get"),
//!     set_private(),
//!     set_timestamp(),
//!     set_signature("secret_key"),
//! ]);
//! let response = client.execute(request).await?;
//! let mode: serde_json::Value = decode_response(response).await?;
//! # let _ = mode;
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming subscription
//! ```rust,no_run
//! use dapix::core::kernel::*;
//! use dapix::ExchangeError;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl StreamHandler for Printer {
//!     fn endpoint(&self, config: &StreamConfig) -> String {
//!         format!("{}://{}", config.scheme(), config.name)
//!     }
//!     fn channels(&self, config: &StreamConfig) -> Vec<String> {
//!         config.symbols.iter().map(|s| format!("{}@{}", s, config.service)).collect()
//!     }
//!     fn on_error(&self, error: ExchangeError) {
//!         eprintln!("stream failed: {}", error);
//!     }
//!     fn on_message(&self, frame: &[u8]) {
//!         println!("{}", String::from_utf8_lossy(frame));
//!     }
//! }
//!
//! # async fn example() -> Result<(), ExchangeError> {
//! let config = StreamConfig::new("dstream.binance.com/ws")
//!     .with_symbols(["btcusd_perp"])
//!     .with_service("aggTrade");
//! let session = start_subscribe(Arc::new(Printer), &config).await?;
//! tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod request;
pub mod rest;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use request::{
    parse_method, set_endpoint, set_headers, set_method, set_params, set_private, set_signature,
    set_timestamp, timestamp_millis, HttpParameter, ParamMap, ParamMode, PreparedRequest,
    RequestMessage, RequestOption, Scheme, API_KEY_HEADER, FORM_CONTENT_TYPE, TIMESTAMP_KEY,
};
pub use rest::{decode_response, HttpClient, HttpClientConfig, HttpTransport};
pub use signer::{sign_query, HmacSigner, Signer, SIGNATURE_KEY};
pub use ws::{
    start_subscribe, SessionState, StreamConfig, StreamHandler, StreamSession, SubscriptionRequest,
    SUBSCRIBE, UNSUBSCRIBE,
};
