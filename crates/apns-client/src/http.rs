//! HTTP/2 transport: `reqwest` delivery with optional ES256 provider tokens.
//!
//! With a [`TokenSigner`] every request carries `authorization: bearer <jwt>`
//! and the transport reports [`AuthMode::Token`]. Without one, the TLS
//! identity configured on the supplied `reqwest::Client` authenticates the
//! connection and the transport reports [`AuthMode::Certificate`].

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{DEVICE_PATH, Environment};
use crate::config::ApnsConfig;
use crate::logging::token_prefix;
use crate::transport::{AuthMode, PushRequest, Transport, TransportError, TransportResponse};

/// JWT token validity period (55 minutes, refreshed before the 1-hour expiry).
const TOKEN_VALIDITY: Duration = Duration::from_secs(55 * 60);

/// Request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters left unescaped in the device-token path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Transport construction errors.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Failed to read private key file.
    #[error("failed to read APNs key at {path}: {reason}")]
    KeyRead {
        /// Key file path.
        path: String,
        /// Error description.
        reason: String,
    },
    /// Failed to parse private key.
    #[error("failed to parse APNs key: {reason}")]
    KeyParse {
        /// Error description.
        reason: String,
    },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Error description.
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider tokens
// ─────────────────────────────────────────────────────────────────────────────

/// JWT claims for provider authentication.
#[derive(Debug, Serialize, Deserialize)]
struct ProviderClaims {
    /// Issuer (Team ID).
    iss: String,
    /// Issued at (Unix timestamp).
    iat: i64,
}

/// Cached JWT token with expiry tracking.
struct CachedToken {
    token: String,
    created_at: Instant,
}

/// Signs and caches ES256 provider tokens.
pub struct TokenSigner {
    key_id: String,
    team_id: String,
    encoding_key: EncodingKey,
    cached_token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key_id", &self.key_id)
            .field("team_id", &self.team_id)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Signer from a PEM-encoded P-256 private key.
    pub fn from_pem(key_id: impl Into<String>, team_id: impl Into<String>, pem: &[u8]) -> Result<Self, SetupError> {
        let encoding_key = EncodingKey::from_ec_pem(pem).map_err(|e| SetupError::KeyParse {
            reason: e.to_string(),
        })?;
        Ok(Self {
            key_id: key_id.into(),
            team_id: team_id.into(),
            encoding_key,
            cached_token: Mutex::new(None),
        })
    }

    /// Signer reading the key at `key_path`.
    pub fn from_file(key_id: impl Into<String>, team_id: impl Into<String>, key_path: &Path) -> Result<Self, SetupError> {
        let pem = std::fs::read(key_path).map_err(|e| SetupError::KeyRead {
            path: key_path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_pem(key_id, team_id, &pem)
    }

    /// Get a cached JWT or generate a new one.
    pub fn token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let mut cached = self
            .cached_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(ref token) = *cached {
            if token.created_at.elapsed() < TOKEN_VALIDITY {
                return Ok(token.token.clone());
            }
        }

        let jwt = self.generate_jwt()?;
        *cached = Some(CachedToken {
            token: jwt.clone(),
            created_at: Instant::now(),
        });
        debug!(key_id = %self.key_id, "APNs provider token refreshed");

        Ok(jwt)
    }

    fn generate_jwt(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        let claims = ProviderClaims {
            iss: self.team_id.clone(),
            iat: chrono::Utc::now().timestamp(),
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// [`Transport`] over `reqwest`.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    signer: Option<TokenSigner>,
}

impl HttpTransport {
    /// HTTP/2 transport for `environment`.
    ///
    /// Pass `None` for `signer` only when certificate authentication is done
    /// by a client built with [`HttpTransport::with_client`].
    pub fn new(environment: Environment, signer: Option<TokenSigner>) -> Result<Self, SetupError> {
        // APNs requires HTTP/2; ALPN alone would let reqwest fall back to 1.1.
        let client = reqwest::Client::builder()
            .http2_prior_knowledge()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SetupError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self::with_client(client, environment.host(), signer))
    }

    /// Transport over a caller-built client, e.g. one carrying a TLS identity.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, signer: Option<TokenSigner>) -> Self {
        let base_url = base_url.into();
        info!(
            base_url = %base_url,
            auth_mode = if signer.is_some() { "token" } else { "certificate" },
            "APNs HTTP transport initialized"
        );
        Self {
            client,
            base_url,
            signer,
        }
    }

    /// Token-authenticated transport from a loaded configuration.
    pub fn from_config(config: &ApnsConfig, key_path: &Path) -> Result<Self, SetupError> {
        let signer = TokenSigner::from_file(&config.key_id, &config.team_id, key_path)?;
        Self::new(config.environment(), Some(signer))
    }

    /// Full request URL for `device_token`.
    pub fn url_for(&self, device_token: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            DEVICE_PATH,
            utf8_percent_encode(device_token, PATH_SEGMENT)
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn auth_mode(&self) -> AuthMode {
        if self.signer.is_some() {
            AuthMode::Token
        } else {
            AuthMode::Certificate
        }
    }

    async fn send(&self, request: PushRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request.device_token);
        let mut builder = self.client.post(&url);
        if let Some(signer) = &self.signer {
            let jwt = signer.token().map_err(|e| TransportError::Auth(e.to_string()))?;
            builder = builder.header("authorization", format!("bearer {jwt}"));
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        debug!(
            token_len = request.device_token.len(),
            token_prefix = token_prefix(&request.device_token),
            body_len = request.body.len(),
            "APNs request"
        );

        let response = builder.body(request.body).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Connect(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_owned(), v.to_owned())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(TransportResponse { status, headers, body })
    }
}
