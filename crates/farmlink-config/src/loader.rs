// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./farmlink.toml` > `~/.config/farmlink/farmlink.toml` > `/etc/farmlink/farmlink.toml`
//! with environment variable overrides via `FARMLINK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::legacy;
use crate::model::FarmlinkConfig;

/// Config sections addressable through `FARMLINK_<SECTION>_<KEY>`.
const SECTIONS: &[&str] = &["server", "storage", "whatsapp", "grading", "admin"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/farmlink/farmlink.toml` (system-wide)
/// 3. `~/.config/farmlink/farmlink.toml` (user XDG config)
/// 4. `./farmlink.toml` (local directory)
/// 5. Deployment variables `PORT`, `AI_SERVICE_URL`, `BACKEND_PUBLIC_URL`
/// 6. `FARMLINK_*` environment variables
///
/// Accounts declared through `TWILIO_*` variables are appended after the
/// accounts declared in TOML.
pub fn load_config() -> Result<FarmlinkConfig, figment::Error> {
    let mut config: FarmlinkConfig = build_figment().extract()?;
    config
        .whatsapp
        .accounts
        .extend(legacy::legacy_accounts(std::env::vars()));
    Ok(config)
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FarmlinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FarmlinkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FarmlinkConfig, figment::Error> {
    let mut config: FarmlinkConfig = Figment::new()
        .merge(Serialized::defaults(FarmlinkConfig::default()))
        .merge(Toml::file(path))
        .merge(deployment_env_provider())
        .merge(env_provider())
        .extract()?;
    config
        .whatsapp
        .accounts
        .extend(legacy::legacy_accounts(std::env::vars()));
    Ok(config)
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FarmlinkConfig::default()))
        .merge(Toml::file("/etc/farmlink/farmlink.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("farmlink/farmlink.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("farmlink.toml"))
        .merge(deployment_env_provider())
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` so that underscore-containing key
/// names survive: `FARMLINK_WHATSAPP_SEND_TIMEOUT_SECS` must map to
/// `whatsapp.send_timeout_secs`, not `whatsapp.send.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("FARMLINK_").map(|key| map_section_key(key.as_str()).into())
}

/// Map a lowercased `section_key` env name to `section.key`.
fn map_section_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

/// Unprefixed variables set by hosting platforms and older deployments.
fn deployment_env_provider() -> Env {
    Env::raw()
        .only(&["PORT", "AI_SERVICE_URL", "BACKEND_PUBLIC_URL"])
        .map(|key| {
            match key.as_str().to_ascii_lowercase().as_str() {
                "port" => "server.port",
                "ai_service_url" => "grading.service_url",
                _ => "server.public_url",
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_keys_keep_inner_underscores() {
        assert_eq!(
            map_section_key("whatsapp_send_timeout_secs"),
            "whatsapp.send_timeout_secs"
        );
        assert_eq!(
            map_section_key("STORAGE_DATABASE_PATH"),
            "storage.database_path"
        );
        assert_eq!(map_section_key("admin_bearer_token"), "admin.bearer_token");
    }

    #[test]
    fn unknown_sections_pass_through() {
        assert_eq!(map_section_key("agent_name"), "agent_name");
        // A section name must be followed by an underscore to match.
        assert_eq!(map_section_key("servers_port"), "servers_port");
    }
}
