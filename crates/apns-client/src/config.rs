//! APNs configuration loading from `~/.config/apns/`.

use std::path::{Path, PathBuf};

use apns_payload::EncoderMode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{ClientConfig, Environment, MAX_TOKENS};

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// APNs configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApnsConfig {
    /// Apple Developer Key ID (10-char alphanumeric).
    pub key_id: String,
    /// Apple Developer Team ID (10-char alphanumeric).
    pub team_id: String,
    /// App bundle identifier (e.g., "com.example.App").
    pub bundle_id: String,
    /// APNs environment: "sandbox" or "production".
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Optional explicit path to the .p8 key file.
    pub key_path: Option<String>,
    /// Maximum tokens per multi-send.
    #[serde(default = "default_token_limit")]
    pub token_limit: usize,
    /// Use the pooled fast encoder instead of `serde_json`.
    #[serde(default = "default_fast_json")]
    pub fast_json: bool,
}

fn default_environment() -> String {
    "sandbox".to_string()
}

fn default_token_limit() -> usize {
    MAX_TOKENS
}

fn default_fast_json() -> bool {
    true
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/root".to_string()))
}

/// Default configuration directory: `~/.config/apns`.
pub fn default_config_dir() -> PathBuf {
    home_dir().join(".config").join("apns")
}

impl ApnsConfig {
    /// Resolve the private key path.
    ///
    /// `~` expands to `$HOME`; other relative paths are taken relative to
    /// `config_dir`. Without an explicit path the key is
    /// `<config_dir>/AuthKey_{keyId}.p8`.
    pub fn resolved_key_path(&self, config_dir: &Path) -> PathBuf {
        match self.key_path.as_deref() {
            Some(path) if path.starts_with('~') => home_dir().join(path.trim_start_matches("~/")),
            Some(path) => config_dir.join(path),
            None => config_dir.join(format!("AuthKey_{}.p8", self.key_id)),
        }
    }

    /// Parsed environment. Anything but "production" is development.
    pub fn environment(&self) -> Environment {
        if self.environment == "production" {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    /// Client settings derived from this configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            environment: self.environment(),
            token_limit: self.token_limit,
            encoder: if self.fast_json {
                EncoderMode::Fast
            } else {
                EncoderMode::Reflective
            },
        }
    }
}

/// Load APNs config from `~/.config/apns/config.json`.
///
/// Returns `None` if config doesn't exist or is invalid; the reason is logged.
pub fn load_apns_config() -> Option<(ApnsConfig, PathBuf)> {
    load_from_path(None)
}

/// Load APNs config from a specific directory, returning it with the
/// resolved key path.
pub fn load_from_path(base: Option<&Path>) -> Option<(ApnsConfig, PathBuf)> {
    let config_dir = base.map_or_else(default_config_dir, Path::to_path_buf);
    let config_path = config_dir.join(CONFIG_FILE);

    if !config_path.exists() {
        debug!(?config_path, "APNs config not found");
        return None;
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            warn!(?config_path, error = %e, "failed to read APNs config");
            return None;
        }
    };

    let config: ApnsConfig = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!(?config_path, error = %e, "failed to parse APNs config");
            return None;
        }
    };

    if config.key_id.is_empty() || config.team_id.is_empty() || config.bundle_id.is_empty() {
        warn!("APNs config missing required fields (keyId, teamId, bundleId)");
        return None;
    }

    if config.token_limit == 0 {
        warn!("APNs config tokenLimit must be positive");
        return None;
    }

    let key_path = config.resolved_key_path(&config_dir);
    if !key_path.exists() {
        warn!(?key_path, "APNs private key file not found");
        return None;
    }

    debug!(
        key_id = %config.key_id,
        team_id = %config.team_id,
        bundle_id = %config.bundle_id,
        environment = %config.environment,
        "APNs config loaded"
    );

    Some((config, key_path))
}
