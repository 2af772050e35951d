// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health and provider diagnostics.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use farmlink_core::{HealthStatus, types::now_timestamp};
use farmlink_whatsapp::DeliveryError;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::error::ApiError;
use crate::handlers::public_base;
use crate::state::AppState;

const DEFAULT_TEST_MESSAGE: &str = "FarmLink test message: WhatsApp delivery is working.";

/// GET /api/health
pub async fn health(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let connected = match state.store.health_check().await {
        Ok(HealthStatus::Healthy) => true,
        Ok(status) => {
            warn!(?status, "storage not healthy");
            false
        }
        Err(e) => {
            warn!(error = %e, "storage health check failed");
            false
        }
    };

    Json(json!({
        "status": "ok",
        "message": "FarmLink server is running",
        "timestamp": now_timestamp(),
        "db": { "connected": connected },
        "config": {
            "ai_service_url": if state.settings.grading_configured { "set" } else { "unset" },
            "backend_public_url": public_base(&state, &headers),
            "whatsapp_accounts": state.pool().len(),
        }
    }))
}

/// GET /api/test-twilio
pub async fn provider_status(State(state): State<AppState>) -> Json<Value> {
    let count = state.pool().len();
    let message = if count == 0 {
        "No WhatsApp provider accounts configured".to_string()
    } else {
        format!("{count} WhatsApp provider account(s) configured")
    };
    Json(json!({
        "success": count > 0,
        "message": message,
        "accountCount": count,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct TestSendRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// POST /api/test-twilio
pub async fn send_test(
    State(state): State<AppState>,
    Json(body): Json<TestSendRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(to) = body.to.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Err(ApiError::bad_request("`to` is required"));
    };
    let text = body
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_TEST_MESSAGE);

    match state.notifier.notify_address(to, text).await {
        Ok(delivery) => Ok(Json(json!({
            "success": true,
            "message": "Test message sent",
            "sid": delivery.message_id,
            "from": delivery.identity.from,
            "accountId": delivery.identity.account_id(),
            "attempts": delivery.attempts,
        }))),
        Err(e) => {
            let status = match &e {
                DeliveryError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
                DeliveryError::NoProviderConfigured => StatusCode::SERVICE_UNAVAILABLE,
                DeliveryError::TransientProvider { .. } | DeliveryError::PermanentMessage { .. } => {
                    StatusCode::BAD_GATEWAY
                }
            };
            Err(ApiError::new(status, "Test message failed").with_error(e))
        }
    }
}
