use crate::core::errors::ExchangeError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the request signature
pub const SIGNATURE_KEY: &str = "signature";

/// Signer trait for request authentication
///
/// A signer turns the canonical parameter encoding into a message
/// authentication code. It runs during request finalization, so a failure
/// surfaces as the executor's terminal error rather than at build time.
pub trait Signer: Send + Sync {
    /// Compute the signature over `payload` and return it as lowercase hex
    fn sign(&self, payload: &str) -> Result<String, ExchangeError>;
}

/// HMAC-SHA256 signer keyed with the API secret
#[derive(Clone, Debug)]
pub struct HmacSigner {
    secret_key: Secret<String>,
}

impl HmacSigner {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: Secret::new(secret_key.into()),
        }
    }
}

impl Signer for HmacSigner {
    fn sign(&self, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| ExchangeError::AuthError(format!("Invalid secret key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Sign an encoded query string and append `&signature=<hex>` to it
pub fn sign_query(signer: &dyn Signer, query_string: &str) -> Result<String, ExchangeError> {
    let signature = signer.sign(query_string)?;
    Ok(format!("{}&{}={}", query_string, SIGNATURE_KEY, signature))
}
