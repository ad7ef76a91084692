use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{sign_query, HmacSigner, Signer};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Request, Url};
use secrecy::{ExposeSecret, Secret};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use url::form_urlencoded;

/// Parameter stamped by [`RequestOption::Timestamp`]
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Header carrying the API key on private requests
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";
/// Content type attached whenever a request has parameters
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Protocol scheme chosen when the client is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub const fn from_ssl(use_ssl: bool) -> Self {
        if use_ssl {
            Self::Https
        } else {
            Self::Http
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a parameter merges with earlier values under the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamMode {
    /// Last write wins for the key
    #[default]
    Replace,
    /// Values accumulate, e.g. for repeated filter parameters
    Append,
}

/// A single key/value pair fed to the params or headers of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpParameter {
    pub key: String,
    pub value: String,
    pub mode: ParamMode,
}

impl HttpParameter {
    pub fn replace(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            mode: ParamMode::Replace,
        }
    }

    pub fn append(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            mode: ParamMode::Append,
        }
    }
}

/// Multimap of key to one or more values.
///
/// Keys iterate in sorted order and values keep insertion order, which makes
/// [`ParamMap::encode`] canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    inner: BTreeMap<String, Vec<String>>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, param: HttpParameter) {
        match param.mode {
            ParamMode::Replace => {
                self.inner.insert(param.key, vec![param.value]);
            }
            ParamMode::Append => self.inner.entry(param.key).or_default().push(param.value),
        }
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Form-urlencode as `k1=v1&k1=v2&k2=v3` with keys sorted
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

/// Normalize a method name; anything outside PUT/PATCH/DELETE/POST is GET
pub fn parse_method(name: &str) -> Method {
    match name.to_ascii_uppercase().as_str() {
        "PUT" => Method::PUT,
        "PATCH" => Method::PATCH,
        "DELETE" => Method::DELETE,
        "POST" => Method::POST,
        _ => Method::GET,
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// One facet of a request, applied in order by [`RequestMessage::apply`].
///
/// `Timestamp` stamps the current time when applied and replaces any earlier
/// stamp, so the last one wins. `Signature` and `Signer` can go anywhere in
/// the list: they only attach the signer, and signing happens in
/// [`RequestMessage::finalize`] over whatever parameters are present then.
#[derive(Clone)]
pub enum RequestOption {
    /// Case-insensitive method name, unrecognized names become GET
    Method(String),
    /// Host and path without scheme, stored verbatim
    Endpoint(String),
    Params(Vec<HttpParameter>),
    Headers(Vec<HttpParameter>),
    /// Attach the API key header when executed
    Private,
    /// Stamp `timestamp=<now in ms>`, replacing any earlier stamp
    Timestamp,
    /// Sign the canonical parameter encoding with HMAC-SHA256 under this secret
    Signature(Secret<String>),
    /// Sign with a caller supplied signer
    Signer(Arc<dyn Signer>),
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(m) => f.debug_tuple("Method").field(m).finish(),
            Self::Endpoint(e) => f.debug_tuple("Endpoint").field(e).finish(),
            Self::Params(p) => f.debug_tuple("Params").field(p).finish(),
            Self::Headers(h) => f.debug_tuple("Headers").field(h).finish(),
            Self::Private => f.write_str("Private"),
            Self::Timestamp => f.write_str("Timestamp"),
            Self::Signature(_) => f.write_str("Signature([REDACTED])"),
            Self::Signer(_) => f.write_str("Signer(..)"),
        }
    }
}

pub fn set_method(name: &str) -> RequestOption {
    RequestOption::Method(name.to_string())
}

pub fn set_endpoint(endpoint: impl Into<String>) -> RequestOption {
    RequestOption::Endpoint(endpoint.into())
}

pub fn set_params(params: impl IntoIterator<Item = HttpParameter>) -> RequestOption {
    RequestOption::Params(params.into_iter().collect())
}

pub fn set_headers(headers: impl IntoIterator<Item = HttpParameter>) -> RequestOption {
    RequestOption::Headers(headers.into_iter().collect())
}

pub const fn set_private() -> RequestOption {
    RequestOption::Private
}

pub const fn set_timestamp() -> RequestOption {
    RequestOption::Timestamp
}

pub fn set_signature(secret: impl Into<String>) -> RequestOption {
    RequestOption::Signature(Secret::new(secret.into()))
}

/// Descriptor for one outbound HTTP call.
///
/// Built empty, populated through [`RequestOption`]s or the `with_*` methods,
/// then consumed once by [`RequestMessage::finalize`].
#[derive(Clone, Default)]
pub struct RequestMessage {
    method: Method,
    endpoint: String,
    params: ParamMap,
    headers: ParamMap,
    private: bool,
    signer: Option<Arc<dyn Signer>>,
}

impl fmt::Debug for RequestMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMessage")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("private", &self.private)
            .field("has_signer", &self.signer.is_some())
            .finish()
    }
}

impl RequestMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a descriptor by applying `options` in order
    pub fn from_options(options: impl IntoIterator<Item = RequestOption>) -> Self {
        let mut request = Self::new();
        for option in options {
            request.apply(option);
        }
        request
    }

    pub fn apply(&mut self, option: RequestOption) {
        match option {
            RequestOption::Method(name) => self.method = parse_method(&name),
            RequestOption::Endpoint(endpoint) => self.endpoint = endpoint,
            RequestOption::Params(params) => {
                for param in params {
                    self.params.insert(param);
                }
            }
            RequestOption::Headers(headers) => {
                for header in headers {
                    self.insert_header(header);
                }
            }
            RequestOption::Private => self.private = true,
            RequestOption::Timestamp => self.params.insert(HttpParameter::replace(
                TIMESTAMP_KEY,
                timestamp_millis().to_string(),
            )),
            RequestOption::Signature(secret) => {
                self.signer = Some(Arc::new(HmacSigner::new(secret.expose_secret().as_str())));
            }
            RequestOption::Signer(signer) => self.signer = Some(signer),
        }
    }

    pub fn with(mut self, option: RequestOption) -> Self {
        self.apply(option);
        self
    }

    pub fn with_method(self, name: &str) -> Self {
        self.with(set_method(name))
    }

    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        self.with(set_endpoint(endpoint))
    }

    pub fn with_params(self, params: impl IntoIterator<Item = HttpParameter>) -> Self {
        self.with(set_params(params))
    }

    pub fn with_headers(self, headers: impl IntoIterator<Item = HttpParameter>) -> Self {
        self.with(set_headers(headers))
    }

    pub fn with_private(self) -> Self {
        self.with(set_private())
    }

    pub fn with_timestamp(self) -> Self {
        self.with(set_timestamp())
    }

    pub fn with_signature(self, secret: impl Into<String>) -> Self {
        self.with(set_signature(secret))
    }

    pub fn with_signer(self, signer: Arc<dyn Signer>) -> Self {
        self.with(RequestOption::Signer(signer))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    /// Headers keyed by lowercase name
    pub fn headers(&self) -> &ParamMap {
        &self.headers
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    fn insert_header(&mut self, mut header: HttpParameter) {
        header.key.make_ascii_lowercase();
        self.headers.insert(header);
    }

    /// Compute the derived fields and consume the descriptor.
    ///
    /// Steps run in a fixed order: API key header when private, form content
    /// type when there are params, then sign (or plain-encode) the params,
    /// then compose `scheme://endpoint[?body]`. A signing failure aborts
    /// before anything is sent.
    pub fn finalize(mut self, api_key: &str, scheme: Scheme) -> Result<PreparedRequest, ExchangeError> {
        if self.private {
            self.insert_header(HttpParameter::replace(API_KEY_HEADER, api_key));
        }

        if !self.params.is_empty() {
            self.insert_header(HttpParameter::replace("Content-Type", FORM_CONTENT_TYPE));
        }

        let encoded = self.params.encode();
        let body_string = match &self.signer {
            Some(signer) if !encoded.is_empty() => sign_query(signer.as_ref(), &encoded)?,
            _ => encoded,
        };

        let full_url = if body_string.is_empty() {
            format!("{}://{}", scheme, self.endpoint)
        } else {
            format!("{}://{}?{}", scheme, self.endpoint, body_string)
        };

        let mut headers = HeaderMap::new();
        for (name, value) in self.headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ExchangeError::InvalidParameters(format!("Invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ExchangeError::InvalidParameters(format!("Invalid value for header '{}': {}", name, e))
            })?;
            headers.append(name, value);
        }

        Ok(PreparedRequest {
            method: self.method,
            full_url,
            body_string,
            headers,
        })
    }
}

/// A finalized request, ready to hand to a transport
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub full_url: String,
    pub body_string: String,
    pub headers: HeaderMap,
}

impl PreparedRequest {
    /// Build the outgoing request. All data travels in the query string, so no body is set.
    pub fn into_request(self) -> Result<Request, ExchangeError> {
        let url = Url::parse(&self.full_url)?;
        let mut request = Request::new(self.method, url);
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}
