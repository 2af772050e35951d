// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the FarmLink marketplace.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level FarmLink configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FarmlinkConfig {
    /// HTTP server and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// WhatsApp provider accounts and delivery settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// External AI grading service settings.
    #[serde(default)]
    pub grading: GradingConfig,

    /// Admin API settings.
    #[serde(default)]
    pub admin: AdminConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Public base URL of this backend, used to build image URLs for the
    /// grading service and to validate webhook signatures. Derived from
    /// request headers when unset.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            public_url: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "farmlink.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// How the webhook delivers the listing confirmation back to the farmer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    /// Answer inline in the webhook response body (TwiML).
    #[default]
    Twiml,
    /// Answer with an empty TwiML document and send the confirmation
    /// through the outbound dispatcher instead.
    Api,
}

/// One messaging-provider credential pair and the numbers it may send from.
///
/// Both credential halves are optional here so that a half-configured
/// account can be reported and skipped rather than failing startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderAccountConfig {
    /// Provider account identifier (Twilio Account SID).
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Provider account secret (Twilio Auth Token).
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sending numbers bound to this account, in priority order. Either
    /// `+15551234567` or `whatsapp:+15551234567`.
    #[serde(default)]
    pub numbers: Vec<String>,
}

/// WhatsApp delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Provider accounts in priority order.
    #[serde(default)]
    pub accounts: Vec<ProviderAccountConfig>,

    /// Upper bound for a single send attempt through one identity.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// How listing confirmations are returned to the farmer.
    #[serde(default)]
    pub reply_mode: ReplyMode,

    /// Reject inbound webhooks without a valid `X-Twilio-Signature`.
    #[serde(default)]
    pub validate_signatures: bool,

    /// Directory where downloaded listing photos are stored.
    #[serde(default = "default_media_dir")]
    pub media_dir: String,

    /// Upper bound for downloading one inbound photo.
    #[serde(default = "default_media_timeout_secs")]
    pub media_timeout_secs: u64,

    /// Base URL of the provider REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            send_timeout_secs: default_send_timeout_secs(),
            reply_mode: ReplyMode::default(),
            validate_signatures: false,
            media_dir: default_media_dir(),
            media_timeout_secs: default_media_timeout_secs(),
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_send_timeout_secs() -> u64 {
    15
}

fn default_media_dir() -> String {
    "public/uploads".to_string()
}

fn default_media_timeout_secs() -> u64 {
    10
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

/// External grading service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GradingConfig {
    /// Base URL of the grading service (`POST {service_url}/grade`).
    #[serde(default = "default_grading_url")]
    pub service_url: String,

    /// Upper bound for one grading call.
    #[serde(default = "default_grading_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            service_url: default_grading_url(),
            timeout_secs: default_grading_timeout_secs(),
        }
    }
}

fn default_grading_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_grading_timeout_secs() -> u64 {
    10
}

/// Admin API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Bearer token for admin routes. `None` rejects every admin request.
    #[serde(default)]
    pub bearer_token: Option<String>,
}
