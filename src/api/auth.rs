//! API credentials and request signing
//!
//! Every private endpoint expects four headers: the API key, the passphrase,
//! a unix timestamp, and a base64 HMAC-SHA256 signature of
//! `timestamp + METHOD + request_path + body` keyed by the base64-decoded
//! secret.

use crate::fills::FillError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_API_SECRET: &str = "API_SECRET";
pub const ENV_API_PASSPHRASE: &str = "API_PASSPHRASE";

/// Exchange API credentials
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Load credentials from `API_KEY`, `API_SECRET` and `API_PASSPHRASE`
    pub fn from_env() -> Result<Self, FillError> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| FillError::Config(format!("missing environment variable {}", name)))
        };
        Ok(Self::new(
            var(ENV_API_KEY)?,
            var(ENV_API_SECRET)?,
            var(ENV_API_PASSPHRASE)?,
        ))
    }
}

/// Produces signature headers for authenticated requests
#[derive(Clone)]
pub struct Signer {
    credentials: Credentials,
    key: Vec<u8>,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(credentials: Credentials) -> Result<Self, FillError> {
        if credentials.api_key.is_empty() || credentials.passphrase.is_empty() {
            return Err(FillError::Config("API key and passphrase must be set".into()));
        }
        let key = STANDARD
            .decode(credentials.secret.trim())
            .map_err(|e| FillError::Config(format!("API secret is not valid base64: {}", e)))?;
        Ok(Self { credentials, key })
    }

    /// Base64 signature of a request
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<String, FillError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| FillError::Config(format!("HMAC setup failed: {}", e)))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.to_uppercase().as_bytes());
        mac.update(request_path.as_bytes());
        mac.update(body.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Header name/value pairs for one request
    pub fn headers(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<Vec<(&'static str, String)>, FillError> {
        let signature = self.sign(timestamp, method, request_path, body)?;
        Ok(vec![
            ("CB-ACCESS-KEY", self.credentials.api_key.clone()),
            ("CB-ACCESS-SIGN", signature),
            ("CB-ACCESS-TIMESTAMP", timestamp.to_string()),
            ("CB-ACCESS-PASSPHRASE", self.credentials.passphrase.clone()),
        ])
    }
}
