//! Dispatch engine: single and multi-recipient sends.
//!
//! [`Client::push`] validates, encodes, size-checks and sends one envelope.
//! [`Client::push_multi`] does the local work once, sends to the first token
//! inline, then fans the remaining tokens out as one task each and waits for
//! all of them before returning. The tasks live in a [`JoinSet`], so dropping
//! the call aborts every send that has not completed.

use std::collections::HashMap;
use std::sync::Arc;

use apns_payload::{BufferPool, EncoderMode, Payload, encode};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{ConfigError, MultiError, PushError};
use crate::logging::token_prefix;
use crate::notification::{Notification, PushType};
use crate::response::{Response, classify};
use crate::transport::{AuthMode, PushRequest, Transport};

/// Production endpoint.
pub const PRODUCTION_HOST: &str = "https://api.push.apple.com:443";

/// Development (sandbox) endpoint.
pub const DEVELOPMENT_HOST: &str = "https://api.sandbox.push.apple.com:443";

/// Request path prefix; the escaped device token follows.
pub const DEVICE_PATH: &str = "/3/device/";

/// Default ceiling on tokens per multi-send.
pub const MAX_TOKENS: usize = 100;

/// Service environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Live devices.
    #[default]
    Production,
    /// Development builds.
    #[serde(alias = "sandbox")]
    Development,
}

impl Environment {
    /// Base URL of the environment.
    pub fn host(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_HOST,
            Self::Development => DEVELOPMENT_HOST,
        }
    }
}

/// Client behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Target environment. Decides whether `apns-unique-id` is read.
    pub environment: Environment,
    /// Maximum tokens accepted by [`Client::push_multi`].
    pub token_limit: usize,
    /// Payload encoder.
    pub encoder: EncoderMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            token_limit: MAX_TOKENS,
            encoder: EncoderMode::Fast,
        }
    }
}

/// Push client over a [`Transport`].
///
/// Cheap to clone; clones share the transport and the encode buffer pool.
pub struct Client<T> {
    transport: Arc<T>,
    config: ClientConfig,
    pool: Arc<BufferPool>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: self.config,
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport + 'static> Client<T> {
    /// Create a client owning `transport`.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::from_arc(Arc::new(transport), config)
    }

    /// Create a client over a shared transport.
    pub fn from_arc(transport: Arc<T>, config: ClientConfig) -> Self {
        info!(
            environment = ?config.environment,
            token_limit = config.token_limit,
            encoder = ?config.encoder,
            auth_mode = ?transport.auth_mode(),
            "APNs client initialized"
        );
        Self {
            transport,
            config,
            pool: Arc::new(BufferPool::default()),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send one notification.
    ///
    /// Nothing is sent when validation, the auth-mode check, encoding or the
    /// size check fails. Service rejections carry the reply [`Response`].
    pub async fn push(
        &self,
        notification: &Notification,
        cancel: &CancellationToken,
    ) -> Result<Response, PushError> {
        let body = self.prepare(notification)?;
        let request = PushRequest {
            device_token: notification.device_token.clone(),
            headers: notification.headers(),
            body,
        };
        deliver(self.transport.as_ref(), self.config.environment, request, cancel).await
    }

    /// Send one notification to every token in `tokens`.
    ///
    /// The envelope is validated and encoded once, using the first token as
    /// the destination. A transport failure or cancellation on the first
    /// token returns immediately; every other per-recipient failure is
    /// collected into [`PushError::Batch`] alongside the successes.
    pub async fn push_multi(
        &self,
        notification: &Notification,
        tokens: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Response>, PushError> {
        let Some((first_token, remaining)) = tokens.split_first() else {
            return Err(ConfigError::EmptyTokenList.into());
        };
        if tokens.len() > self.config.token_limit {
            return Err(ConfigError::TokenLimitExceeded {
                got: tokens.len(),
                limit: self.config.token_limit,
            }
            .into());
        }

        let mut first = notification.clone();
        first.device_token.clone_from(first_token);
        let body = self.prepare(&first)?;
        let headers = first.headers();

        debug!(
            recipients = tokens.len(),
            push_type = %first.push_type,
            body_len = body.len(),
            "APNs multi-send"
        );

        let mut successes = Vec::with_capacity(tokens.len());
        let mut failures = HashMap::new();

        let request = PushRequest {
            device_token: first_token.clone(),
            headers: headers.clone(),
            body: body.clone(),
        };
        match deliver(self.transport.as_ref(), self.config.environment, request, cancel).await {
            Ok(response) => successes.push(response),
            Err(e @ (PushError::Transport(_) | PushError::Cancelled)) => return Err(e),
            Err(e) => {
                let _ = failures.insert(first_token.clone(), e);
            }
        }

        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(remaining.len());
        for token in remaining {
            let transport = Arc::clone(&self.transport);
            let environment = self.config.environment;
            let cancel = cancel.clone();
            let request = PushRequest {
                device_token: token.clone(),
                headers: headers.clone(),
                body: body.clone(),
            };
            let handle = tasks.spawn(async move {
                let token = request.device_token.clone();
                let result = deliver(transport.as_ref(), environment, request, &cancel).await;
                (token, result)
            });
            let _ = pending.insert(handle.id(), token.clone());
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, (token, result))) => {
                    let _ = pending.remove(&id);
                    match result {
                        Ok(response) => successes.push(response),
                        Err(e) => {
                            let _ = failures.insert(token, e);
                        }
                    }
                }
                Err(e) => {
                    let token = pending.remove(&e.id()).unwrap_or_default();
                    warn!(token_prefix = token_prefix(&token), error = %e, "APNs send task aborted");
                    let _ = failures.entry(token).or_insert_with(|| PushError::Task(e.to_string()));
                }
            }
        }

        if failures.is_empty() {
            info!(delivered = successes.len(), "APNs multi-send OK");
            return Ok(successes);
        }
        warn!(
            delivered = successes.len(),
            failed = failures.len(),
            "APNs multi-send partially FAILED"
        );
        Err(PushError::Batch(MultiError { successes, failures }))
    }

    /// Validate, check the auth mode, encode and size-check.
    fn prepare(&self, notification: &Notification) -> Result<Bytes, PushError> {
        notification.validate()?;
        if notification.push_type == PushType::Location && self.transport.auth_mode() == AuthMode::Certificate {
            return Err(ConfigError::LocationRequiresTokenAuth.into());
        }

        let fallback = Payload::default();
        let payload = notification.payload.as_ref().unwrap_or(&fallback);
        let body = encode(payload, self.config.encoder, &self.pool)?;

        let limit = notification.push_type.payload_limit();
        if body.len() > limit {
            warn!(
                push_type = %notification.push_type,
                size = body.len(),
                limit,
                "APNs payload too large"
            );
            return Err(PushError::PayloadTooLarge {
                push_type: notification.push_type,
                size: body.len(),
                limit,
            });
        }
        Ok(Bytes::from(body))
    }
}

/// Issue one request unless cancelled, then classify the reply.
async fn deliver<T: Transport + ?Sized>(
    transport: &T,
    environment: Environment,
    request: PushRequest,
    cancel: &CancellationToken,
) -> Result<Response, PushError> {
    let token = request.device_token.clone();
    if cancel.is_cancelled() {
        debug!(token_prefix = token_prefix(&token), "APNs send skipped, cancelled");
        return Err(PushError::Cancelled);
    }

    let raw = match transport.send(request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                token_len = token.len(),
                token_prefix = token_prefix(&token),
                error = %e,
                "APNs request FAILED (transport error)"
            );
            return Err(e.into());
        }
    };

    match classify(environment, &token, &raw) {
        Ok(response) => {
            debug!(
                status = raw.status,
                token_prefix = token_prefix(&token),
                apns_id = %response.apns_id,
                "APNs send OK"
            );
            Ok(response)
        }
        Err(e) => {
            warn!(
                status = raw.status,
                token_prefix = token_prefix(&token),
                error = %e,
                "APNs send FAILED"
            );
            Err(e)
        }
    }
}
