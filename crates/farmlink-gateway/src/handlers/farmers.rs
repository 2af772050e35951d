// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Farmer registration and the admin approval workflow under `/api/farmers`.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use farmlink_core::{ApprovalStatus, Farmer, FarmlinkError, types::now_timestamp};
use farmlink_whatsapp::{normalize, templates};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::auth::admin_user;
use crate::error::ApiError;
use crate::handlers::present;
use crate::state::AppState;

const DUPLICATE_PHONE: &str = "A farmer with this phone number is already registered";

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub crops: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateFarmerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "isActive")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct FarmersResponse {
    pub success: bool,
    pub count: usize,
    pub farmers: Vec<Farmer>,
}

#[derive(Debug, Serialize)]
pub struct FarmerResponse {
    pub success: bool,
    pub message: String,
    pub farmer: Farmer,
    /// Why the welcome message could not be sent, on approvals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FarmerResponse {
    fn new(message: impl Into<String>, farmer: Farmer) -> Self {
        Self {
            success: true,
            message: message.into(),
            farmer,
            error: None,
        }
    }
}

async fn load(state: &AppState, id: &str) -> Result<Farmer, ApiError> {
    state
        .store
        .get_farmer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Farmer not found"))
}

/// POST /api/farmers/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(name), Some(phone), Some(village), Some(district)) = (
        present(&body.name),
        present(&body.phone),
        present(&body.village),
        present(&body.district),
    ) else {
        return Err(ApiError::bad_request(
            "Name, phone number, village, and district are required",
        ));
    };
    let phone = normalize(phone).map_err(|_| ApiError::bad_request("Invalid phone number"))?;

    if state.store.find_farmer_by_phone(&phone).await?.is_some() {
        return Err(ApiError::bad_request(DUPLICATE_PHONE));
    }

    let farmer = Farmer::register(
        name,
        phone,
        village,
        district,
        present(&body.crops).unwrap_or_default(),
    );
    match state.store.insert_farmer(&farmer).await {
        Ok(()) => {}
        Err(FarmlinkError::Conflict(_)) => return Err(ApiError::bad_request(DUPLICATE_PHONE)),
        Err(e) => return Err(e.into()),
    }
    info!(farmer_id = %farmer.id, phone = %farmer.phone, "farmer registered, pending approval");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful! Your account is under review. We will contact you shortly for verification.",
            "farmer": {
                "id": farmer.id,
                "name": farmer.name,
                "phone": farmer.phone,
                "village": farmer.village,
                "district": farmer.district,
                "approval_status": farmer.approval_status,
            }
        })),
    ))
}

/// GET /api/farmers?status=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FarmersResponse>, ApiError> {
    let status = match present(&query.status) {
        Some(raw) => Some(
            ApprovalStatus::from_str(raw)
                .map_err(|_| ApiError::bad_request(format!("Unknown approval status: {raw}")))?,
        ),
        None => None,
    };
    let farmers = state.store.list_farmers(status).await?;
    Ok(Json(FarmersResponse {
        success: true,
        count: farmers.len(),
        farmers,
    }))
}

/// POST /api/farmers/approve/{id}
///
/// Approval stands even when the welcome message cannot be delivered.
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FarmerResponse>, ApiError> {
    let mut farmer = load(&state, &id).await?;
    if farmer.approval_status == ApprovalStatus::Approved {
        return Err(ApiError::bad_request("Farmer is already approved"));
    }

    farmer.approval_status = ApprovalStatus::Approved;
    farmer.is_active = true;
    farmer.approved_by = admin_user(&headers);
    farmer.approved_at = Some(now_timestamp());
    state.store.update_farmer(&farmer).await?;
    info!(farmer_id = %farmer.id, approved_by = %farmer.approved_by, "farmer approved");

    match state
        .notifier
        .notify_farmer(&farmer, templates::welcome(&farmer.name))
        .await
    {
        Ok(delivery) => {
            let sent_at = now_timestamp();
            if let Err(e) = state.store.mark_welcome_sent(&farmer.id, &sent_at).await {
                warn!(farmer_id = %farmer.id, error = %e, "failed to record welcome message");
            } else {
                farmer.welcome_sent = true;
                farmer.welcome_sent_at = Some(sent_at);
            }
            info!(
                farmer_id = %farmer.id,
                account_id = delivery.identity.account_id(),
                "welcome message sent"
            );
            Ok(Json(FarmerResponse::new(
                "Farmer approved successfully! Welcome WhatsApp sent.",
                farmer,
            )))
        }
        Err(e) => {
            warn!(farmer_id = %farmer.id, error = %e, "welcome message failed");
            let mut response = FarmerResponse::new(
                "Farmer approved! (WhatsApp notification failed - check Twilio setup)",
                farmer,
            );
            response.error = Some(e.to_string());
            Ok(Json(response))
        }
    }
}

/// POST /api/farmers/reject/{id}
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<FarmerResponse>, ApiError> {
    let mut farmer = load(&state, &id).await?;
    farmer.approval_status = ApprovalStatus::Rejected;
    farmer.is_active = false;
    farmer.rejection_reason = present(&body.reason).unwrap_or("Not specified").to_string();
    state.store.update_farmer(&farmer).await?;
    info!(farmer_id = %farmer.id, reason = %farmer.rejection_reason, "farmer rejected");

    Ok(Json(FarmerResponse::new("Farmer registration rejected", farmer)))
}

/// PUT /api/farmers/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateFarmerRequest>,
) -> Result<Json<FarmerResponse>, ApiError> {
    let mut farmer = load(&state, &id).await?;
    if let Some(name) = present(&body.name) {
        farmer.name = name.to_string();
    }
    if let Some(phone) = present(&body.phone) {
        farmer.phone =
            normalize(phone).map_err(|_| ApiError::bad_request("Invalid phone number"))?;
    }
    if let Some(location) = body.location {
        farmer.location = location;
    }
    if let Some(is_active) = body.is_active {
        farmer.is_active = is_active;
    }
    state.store.update_farmer(&farmer).await?;

    Ok(Json(FarmerResponse::new("Farmer updated successfully!", farmer)))
}

/// DELETE /api/farmers/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.store.delete_farmer(&id).await? {
        return Err(ApiError::not_found("Farmer not found"));
    }
    info!(farmer_id = %id, "farmer deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Farmer deleted successfully!"
    })))
}
