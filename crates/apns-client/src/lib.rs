//! # apns-client
//!
//! Notification envelopes and dispatch to the Apple Push Notification service.
//!
//! - **Envelope**: [`Notification`] with [`PushType`], [`Priority`], topic and header derivation
//! - **Dispatch**: [`Client::push`] and [`Client::push_multi`] over any [`Transport`]
//! - **Responses**: [`Response`], [`ServiceError`], and the [`PushError`] taxonomy
//! - **HTTP**: [`HttpTransport`] (HTTP/2, ES256 provider tokens) behind the `http` feature
//! - **Config**: [`ApnsConfig`] loaded from `config.json`
//!
//! ## Crate Position
//!
//! Depends on `apns-payload` for payload types and encoding.

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod errors;
#[cfg(feature = "http")]
pub mod http;
pub mod logging;
pub mod notification;
pub mod response;
pub mod transport;

pub use client::{Client, ClientConfig, DEVELOPMENT_HOST, Environment, MAX_TOKENS, PRODUCTION_HOST};
pub use config::{ApnsConfig, load_apns_config};
pub use errors::{ConfigError, MultiError, PushError};
#[cfg(feature = "http")]
pub use http::{HttpTransport, SetupError, TokenSigner};
pub use logging::init_subscriber;
pub use notification::{MAX_PAYLOAD_SIZE, MAX_VOIP_PAYLOAD_SIZE, Notification, NotificationError, Priority, PushType};
pub use response::{Response, ServiceError};
pub use transport::{AuthMode, PushRequest, Transport, TransportError, TransportResponse};

pub use apns_payload;
pub use tokio_util::sync::CancellationToken;
