use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    decode_response, HmacSigner, HttpClient, HttpParameter, HttpTransport, RequestMessage, Signer,
};
use crate::exchanges::delivery::endpoints::{
    rest_endpoint, ENTRY_POINT_DEPTH, REST_HOST, TESTNET_REST_HOST,
};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Coin-margined delivery futures REST operations
///
/// Responses are returned as raw JSON; non-2xx statuses become
/// [`ExchangeError::ApiError`]. Trade operations live in `trading.rs`,
/// account and history queries in `account.rs`.
pub struct DeliveryClient<T = Client> {
    http: HttpClient<T>,
    signer: Arc<dyn Signer>,
    host: String,
    can_sign: bool,
    recv_window: Option<u64>,
}

impl<T> std::fmt::Debug for DeliveryClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClient")
            .field("host", &self.host)
            .field("can_sign", &self.can_sign)
            .field("recv_window", &self.recv_window)
            .finish_non_exhaustive()
    }
}

impl DeliveryClient<Client> {
    pub fn from_config(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let http = HttpClient::new(config.api_key(), config.use_ssl)?;
        Ok(Self::with_http_client(http, config))
    }

    /// Build from `{PREFIX}_API_KEY`, `{PREFIX}_SECRET_KEY` and friends
    pub fn from_env(prefix: &str) -> Result<Self, ExchangeError> {
        let config = ExchangeConfig::from_env(prefix)?;
        Self::from_config(&config)
    }
}

impl<T: HttpTransport> DeliveryClient<T> {
    /// Wrap an existing executor; the host and signing key come from `config`
    pub fn with_http_client(http: HttpClient<T>, config: &ExchangeConfig) -> Self {
        let host = config.base_url.clone().unwrap_or_else(|| {
            if config.testnet {
                TESTNET_REST_HOST.to_string()
            } else {
                REST_HOST.to_string()
            }
        });

        Self {
            http,
            signer: Arc::new(HmacSigner::new(config.secret_key())),
            host,
            can_sign: config.has_credentials(),
            recv_window: None,
        }
    }

    /// Send `recvWindow` (milliseconds) with every signed request
    pub fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn http(&self) -> &HttpClient<T> {
        &self.http
    }

    /// `GET dapi/v1/depth`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn order_book(&self, symbol: &str, limit: Option<u32>) -> Result<Value, ExchangeError> {
        let mut params = vec![HttpParameter::replace("symbol", symbol)];
        if let Some(limit) = limit {
            params.push(HttpParameter::replace("limit", limit.to_string()));
        }

        let request = RequestMessage::new()
            .with_method("GET")
            .with_endpoint(rest_endpoint(&self.host, ENTRY_POINT_DEPTH))
            .with_params(params);
        self.send(request).await
    }

    /// Private, timestamped and signed request against `entry_point`
    pub(super) fn signed(
        &self,
        method: &str,
        entry_point: &str,
        mut params: Vec<HttpParameter>,
    ) -> Result<RequestMessage, ExchangeError> {
        if !self.can_sign {
            return Err(ExchangeError::AuthError(
                "API key and secret are required for signed endpoints".to_string(),
            ));
        }

        if let Some(recv_window) = self.recv_window {
            params.push(HttpParameter::replace("recvWindow", recv_window.to_string()));
        }

        Ok(RequestMessage::new()
            .with_method(method)
            .with_endpoint(rest_endpoint(&self.host, entry_point))
            .with_params(params)
            .with_private()
            .with_timestamp()
            .with_signer(Arc::clone(&self.signer)))
    }

    pub(super) async fn send(&self, request: RequestMessage) -> Result<Value, ExchangeError> {
        let response = self.http.execute(request).await?;
        decode_response(response).await
    }
}
