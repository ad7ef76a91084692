use crate::core::errors::ExchangeError;
use crate::core::kernel::request::{PreparedRequest, RequestMessage, RequestOption, Scheme};
use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, trace};

/// Transport the executor hands finished requests to
///
/// Implemented for `reqwest::Client`; tests inject a recording stub instead.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and return the response untouched
    async fn send(&self, request: Request) -> Result<Response, ExchangeError>;
}

#[async_trait]
impl HttpTransport for Client {
    async fn send(&self, request: Request) -> Result<Response, ExchangeError> {
        Ok(self.execute(request).await?)
    }
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response, ExchangeError> {
        (**self).send(request).await
    }
}

/// Configuration for the default reqwest transport
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Use `https` rather than `http` when composing URLs
    pub use_ssl: bool,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            use_ssl: true,
            timeout_seconds: 30,
            user_agent: "dapix/0.1".to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn new(use_ssl: bool) -> Self {
        Self {
            use_ssl,
            ..Self::default()
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Client factory and executor for [`RequestMessage`]s
///
/// Holds the scheme and API key, both fixed at construction.
#[derive(Clone)]
pub struct HttpClient<T = Client> {
    transport: T,
    scheme: Scheme,
    api_key: Secret<String>,
}

impl<T> std::fmt::Debug for HttpClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl HttpClient<Client> {
    /// Create a client backed by reqwest with default settings
    pub fn new(api_key: impl Into<String>, use_ssl: bool) -> Result<Self, ExchangeError> {
        Self::from_config(api_key, HttpClientConfig::new(use_ssl))
    }

    pub fn from_config(
        api_key: impl Into<String>,
        config: HttpClientConfig,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_transport(api_key, config.use_ssl, client))
    }
}

impl<T: HttpTransport> HttpClient<T> {
    /// Create a client over an injected transport
    pub fn with_transport(api_key: impl Into<String>, use_ssl: bool, transport: T) -> Self {
        Self {
            transport,
            scheme: Scheme::from_ssl(use_ssl),
            api_key: Secret::new(api_key.into()),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create a fresh descriptor with `options` applied in order
    pub fn request(&self, options: impl IntoIterator<Item = RequestOption>) -> RequestMessage {
        RequestMessage::from_options(options)
    }

    /// Finalize headers, signature and URL without sending anything
    pub fn prepare(&self, request: RequestMessage) -> Result<PreparedRequest, ExchangeError> {
        request.finalize(self.api_key.expose_secret(), self.scheme)
    }

    /// Finalize and send a request, returning the raw response
    ///
    /// Status codes are not interpreted and nothing is retried.
    #[instrument(skip(self, request), fields(method = %request.method(), endpoint = %request.endpoint(), private = request.is_private()))]
    pub async fn execute(&self, request: RequestMessage) -> Result<Response, ExchangeError> {
        let prepared = self.prepare(request)?;
        trace!(url = %prepared.full_url, "sending request");

        let response = self.transport.send(prepared.into_request()?).await?;
        trace!(status = %response.status(), "received response");
        Ok(response)
    }
}

/// Read a response body, mapping non-2xx statuses to [`ExchangeError::ApiError`]
pub async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, ExchangeError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
    })?;

    trace!("Response body: {}", body);

    if status.is_success() {
        serde_json::from_str(&body).map_err(|e| {
            ExchangeError::DeserializationError(format!("Failed to parse JSON response: {}", e))
        })
    } else {
        Err(ExchangeError::ApiError {
            code: i32::from(status.as_u16()),
            message: body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_follows_ssl_flag() {
        assert_eq!(HttpClient::new("k", true).unwrap().scheme(), Scheme::Https);
        assert_eq!(HttpClient::new("k", false).unwrap().scheme(), Scheme::Http);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpClientConfig::new(false)
            .with_timeout(5)
            .with_user_agent("test/1.0".to_string());
        assert!(!config.use_ssl);
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.user_agent, "test/1.0");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = HttpClient::new("super-secret-key", true).unwrap();
        assert!(!format!("{:?}", client).contains("super-secret-key"));
    }
}
