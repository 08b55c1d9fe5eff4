//! # apns-payload
//!
//! Payload model and serialization for Apple Push Notification service requests.
//!
//! - **Leaf types**: [`Ratio`], [`Sound`], [`Alert`], [`EpochTime`]
//! - **`aps` dictionary**: [`Aps`] with cross-field validation (notification vs. live activity)
//! - **Dynamic values**: [`DynamicValue`] for custom data and live-activity maps
//! - **Payload**: [`Payload`] merges `aps` with root-level custom data
//! - **Encoding**: [`encode_fast`] (pooled, hand-built) and [`encode_reflective`] (`serde_json`),
//!   producing semantically identical JSON
//! - **Errors**: [`ValidationError`], [`RatioError`], [`EncodeError`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `apns-client`.

#![deny(unsafe_code)]

pub mod alert;
pub mod aps;
pub mod encode;
pub mod errors;
pub mod payload;
pub mod pool;
pub mod ratio;
pub mod sound;
pub mod time;
pub mod value;

pub use alert::Alert;
pub use aps::{AlertValue, Aps, InterruptionLevel, LiveActivityEvent, RelevanceScore, SoundValue};
pub use encode::{EncoderMode, FastEncode, encode, encode_fast, encode_reflective};
pub use errors::{EncodeError, RatioError, ValidationError};
pub use payload::{APS_KEY, Payload};
pub use pool::{BufferPool, PooledBuffer};
pub use ratio::Ratio;
pub use sound::{CriticalFlag, Sound};
pub use time::EpochTime;
pub use value::{DynamicMap, DynamicValue, MarshalJson};
