// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared state for request handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use farmlink_config::FarmlinkConfig;
use farmlink_config::model::{GradingConfig, ReplyMode};
use farmlink_core::{FarmlinkError, GradingService, StorageAdapter};
use farmlink_grading::GradingJob;
use farmlink_whatsapp::{FailoverDispatcher, FarmerNotifier, MediaDownloader, ProviderPool};

use crate::auth::AdminAuth;
use crate::pipeline::MediaPipeline;

/// Request-independent settings taken from configuration.
#[derive(Clone)]
pub struct GatewaySettings {
    /// Externally reachable base URL, e.g. `https://farmlink.example`.
    pub public_url: Option<String>,
    pub reply_mode: ReplyMode,
    pub validate_signatures: bool,
    /// Whether a grading service other than the local default is configured.
    pub grading_configured: bool,
    /// Directory served under `/uploads`.
    pub media_dir: PathBuf,
    pub admin: AdminAuth,
}

impl GatewaySettings {
    pub fn from_config(config: &FarmlinkConfig) -> Self {
        Self {
            public_url: config
                .server
                .public_url
                .as_deref()
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            reply_mode: config.whatsapp.reply_mode,
            validate_signatures: config.whatsapp.validate_signatures,
            grading_configured: config.grading.service_url
                != GradingConfig::default().service_url,
            media_dir: PathBuf::from(&config.whatsapp.media_dir),
            admin: AdminAuth {
                bearer_token: config.admin.bearer_token.clone(),
            },
        }
    }
}

impl std::fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("public_url", &self.public_url)
            .field("reply_mode", &self.reply_mode)
            .field("validate_signatures", &self.validate_signatures)
            .field("media_dir", &self.media_dir)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StorageAdapter>,
    pub notifier: FarmerNotifier,
    pub pipeline: MediaPipeline,
    pub settings: Arc<GatewaySettings>,
}

impl AppState {
    /// Wire the handlers' collaborators from configuration.
    pub fn new(
        config: &FarmlinkConfig,
        store: Arc<dyn StorageAdapter>,
        dispatcher: Arc<FailoverDispatcher>,
        grader: Arc<dyn GradingService>,
    ) -> Result<Self, FarmlinkError> {
        let settings = GatewaySettings::from_config(config);
        let media = MediaDownloader::new(
            settings.media_dir.clone(),
            Duration::from_secs(config.whatsapp.media_timeout_secs),
        )?
        .with_credential_base(&config.whatsapp.api_base_url);
        let grading = GradingJob::new(store.clone(), grader);
        let pipeline = MediaPipeline::new(
            store.clone(),
            dispatcher.pool().clone(),
            media,
            grading,
        );
        Ok(Self {
            store,
            notifier: FarmerNotifier::new(dispatcher),
            pipeline,
            settings: Arc::new(settings),
        })
    }

    pub fn pool(&self) -> &Arc<ProviderPool> {
        self.notifier.dispatcher().pool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let config = farmlink_config::load_config_from_str(
            r#"
[server]
public_url = "https://farm.example/"

[whatsapp]
reply_mode = "api"

[grading]
service_url = "https://grader.example"

[admin]
bearer_token = "t0ken"
"#,
        )
        .unwrap();
        let settings = GatewaySettings::from_config(&config);
        assert_eq!(settings.public_url.as_deref(), Some("https://farm.example"));
        assert_eq!(settings.reply_mode, ReplyMode::Api);
        assert!(settings.grading_configured);
        assert!(!format!("{settings:?}").contains("t0ken"));
    }

    #[test]
    fn default_grading_url_counts_as_unset() {
        let config = farmlink_config::load_config_from_str("").unwrap();
        let settings = GatewaySettings::from_config(&config);
        assert!(!settings.grading_configured);
        assert!(settings.public_url.is_none());
    }
}
