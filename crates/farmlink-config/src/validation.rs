// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: usable bind address,
//! non-zero timeouts, and well-formed service URLs. Provider accounts are
//! not validated here; the account pool skips unusable ones with a warning.

use crate::diagnostic::ConfigError;
use crate::model::FarmlinkConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first.
pub fn validate_config(config: &FarmlinkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        fail(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        ));
    }

    if config.server.port == 0 {
        fail("server.port must be between 1 and 65535".to_string());
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        fail(format!(
            "server.log_level `{}` must be one of: {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if let Some(url) = &config.server.public_url
        && !is_http_url(url)
    {
        fail(format!("server.public_url `{url}` must start with http:// or https://"));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.whatsapp.send_timeout_secs == 0 {
        fail("whatsapp.send_timeout_secs must be greater than 0".to_string());
    }
    if config.whatsapp.media_timeout_secs == 0 {
        fail("whatsapp.media_timeout_secs must be greater than 0".to_string());
    }
    if config.whatsapp.media_dir.trim().is_empty() {
        fail("whatsapp.media_dir must not be empty".to_string());
    }
    if !is_http_url(&config.whatsapp.api_base_url) {
        fail(format!(
            "whatsapp.api_base_url `{}` must start with http:// or https://",
            config.whatsapp.api_base_url
        ));
    }

    if !is_http_url(&config.grading.service_url) {
        fail(format!(
            "grading.service_url `{}` must start with http:// or https://",
            config.grading.service_url
        ));
    }
    if config.grading.timeout_secs == 0 {
        fail("grading.timeout_secs must be greater than 0".to_string());
    }

    if let Some(token) = &config.admin.bearer_token
        && token.trim().is_empty()
    {
        fail("admin.bearer_token must not be blank when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
