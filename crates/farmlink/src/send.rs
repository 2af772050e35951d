// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `farmlink send-test`: deliver one message through the failover
//! dispatcher, for checking provider credentials from the command line.

use std::path::PathBuf;

use farmlink_config::FarmlinkConfig;
use farmlink_core::FarmlinkError;
use farmlink_whatsapp::OutboundMessage;
use tracing::info;

use crate::serve::build_dispatcher;

const DEFAULT_MESSAGE: &str = "FarmLink test message: WhatsApp delivery is working.";

/// Run the `farmlink send-test` command.
pub async fn run_send_test(
    config: &FarmlinkConfig,
    config_path: Option<PathBuf>,
    to: &str,
    message: Option<&str>,
) -> Result<(), FarmlinkError> {
    let dispatcher = build_dispatcher(config, config_path)?;
    let body = message.unwrap_or(DEFAULT_MESSAGE);

    let delivery = dispatcher
        .send(&OutboundMessage::new(to, body))
        .await
        .map_err(|e| FarmlinkError::Http {
            message: format!("test message failed: {e}"),
            source: Some(Box::new(e)),
        })?;

    info!(
        message_id = %delivery.message_id,
        account_id = delivery.identity.account_id(),
        attempts = delivery.attempts,
        "test message sent"
    );
    println!(
        "sent {} from {} (account {}) after {} attempt(s)",
        delivery.message_id,
        delivery.identity.from,
        delivery.identity.account_id(),
        delivery.attempts
    );
    Ok(())
}
