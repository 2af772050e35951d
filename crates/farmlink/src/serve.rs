// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `farmlink serve`: wire storage, delivery and grading into the HTTP
//! gateway and run until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use farmlink_config::FarmlinkConfig;
use farmlink_core::{FarmlinkError, StorageAdapter};
use farmlink_gateway::AppState;
use farmlink_grading::GradingClient;
use farmlink_storage::SqliteStore;
use farmlink_whatsapp::{ConfigAccounts, FailoverDispatcher, ProviderPool, TwilioTransport};
use tracing::{info, warn};

use crate::shutdown;

/// Build the provider pool and the dispatcher that sends through it.
///
/// The pool re-reads the same configuration source the process started
/// from whenever it is reinitialized.
pub fn build_dispatcher(
    config: &FarmlinkConfig,
    config_path: Option<PathBuf>,
) -> Result<Arc<FailoverDispatcher>, FarmlinkError> {
    let source = match config_path {
        Some(path) => ConfigAccounts::from_path(path),
        None => ConfigAccounts::new(),
    };
    let pool = Arc::new(ProviderPool::initialize(Arc::new(source)));
    if pool.is_empty() {
        warn!("no usable WhatsApp provider accounts, outbound messages will fail");
    }

    let send_timeout = Duration::from_secs(config.whatsapp.send_timeout_secs);
    let transport =
        TwilioTransport::new(send_timeout)?.with_base_url(config.whatsapp.api_base_url.clone());
    Ok(Arc::new(
        FailoverDispatcher::new(pool, Arc::new(transport)).with_attempt_timeout(send_timeout),
    ))
}

/// Runs the `farmlink serve` command.
pub async fn run_serve(
    config: FarmlinkConfig,
    config_path: Option<PathBuf>,
) -> Result<(), FarmlinkError> {
    info!("starting farmlink serve");

    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    info!(path = %config.storage.database_path, "storage initialized");

    let dispatcher = build_dispatcher(&config, config_path)?;
    let grader = Arc::new(GradingClient::new(&config.grading)?);
    info!(endpoint = grader.endpoint(), "grading client ready");

    let state = AppState::new(&config, store.clone(), dispatcher, grader)?;
    let app = farmlink_gateway::router(state);

    let cancel = shutdown::install_signal_handler();
    let served = farmlink_gateway::serve(&config.server.host, config.server.port, app, cancel).await;

    if let Err(e) = store.close().await {
        warn!(error = %e, "failed to checkpoint database on shutdown");
    }
    served?;

    info!("farmlink serve shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatcher_uses_configured_accounts_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("farmlink.toml");
        std::fs::write(
            &path,
            r#"
[[whatsapp.accounts]]
account_sid = "AC1"
auth_token = "secret"
numbers = ["+14155238886"]
"#,
        )
        .unwrap();

        let config = farmlink_config::load_and_validate_path(&path).unwrap();
        let dispatcher = build_dispatcher(&config, Some(path)).unwrap();
        assert_eq!(dispatcher.pool().len(), 1);
        assert!(dispatcher.pool().find_account("AC1").is_some());
    }
}
