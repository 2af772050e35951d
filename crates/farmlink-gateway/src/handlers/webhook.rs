// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound WhatsApp webhook: `POST /api/whatsapp`.
//!
//! Replies synchronously with TwiML. Grading and, in `api` reply mode, the
//! confirmation send run on detached tasks after the reply is built.

use std::collections::BTreeMap;

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use farmlink_config::model::ReplyMode;
use farmlink_core::{Farmer, FarmerAffinity, Listing, ListingParseError, parse_listing};
use farmlink_whatsapp::webhook::{
    InboundMessage, SIGNATURE_HEADER, twiml_empty, twiml_message, validate_signature,
};
use farmlink_whatsapp::{channel_address, normalize, templates};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::handlers::public_base;
use crate::pipeline::MediaTask;
use crate::state::AppState;

fn twiml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

fn reply(text: &str) -> Response {
    twiml(twiml_message(text))
}

/// POST /api/whatsapp
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Form(params): Form<BTreeMap<String, String>>,
) -> Response {
    let base = public_base(&state, &headers);

    if state.settings.validate_signatures && !signature_is_valid(&state, &headers, &uri, &base, &params) {
        warn!("rejecting webhook with invalid signature");
        return StatusCode::FORBIDDEN.into_response();
    }

    let inbound = InboundMessage::from_params(&params);
    debug!(
        from = %inbound.from,
        to = %inbound.to,
        num_media = inbound.num_media,
        "inbound message received"
    );

    match handle(&state, &inbound, &base).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "webhook processing failed");
            reply(templates::INTERNAL_ERROR)
        }
    }
}

async fn handle(
    state: &AppState,
    inbound: &InboundMessage,
    base: &str,
) -> Result<Response, farmlink_core::FarmlinkError> {
    let Ok(phone) = normalize(&inbound.from) else {
        return Ok(reply(templates::NOT_REGISTERED));
    };
    let Some(mut farmer) = state.store.find_farmer_by_phone(&phone).await? else {
        info!(phone = %phone, "message from unregistered number");
        return Ok(reply(templates::NOT_REGISTERED));
    };

    let affinity = FarmerAffinity {
        last_inbound_address: channel_address(&inbound.to).ok(),
        last_provider_account_id: inbound.account_sid.clone(),
    };
    if let Err(e) = state.store.record_affinity(&phone, &affinity).await {
        warn!(phone = %phone, error = %e, "failed to record affinity");
    }
    farmer.last_whatsapp_from = affinity.last_inbound_address.clone().unwrap_or_default();
    farmer.last_account_sid = affinity.last_provider_account_id.clone().unwrap_or_default();

    if !farmer.is_active {
        return Ok(reply(templates::ACCOUNT_INACTIVE));
    }

    let parsed = match parse_listing(&inbound.body) {
        Ok(parsed) => parsed,
        Err(ListingParseError::InvalidFormat) => return Ok(reply(templates::INVALID_FORMAT)),
        Err(ListingParseError::Unparseable) => return Ok(reply(templates::UNPARSEABLE)),
    };

    let media_url = inbound.first_media().map(str::to_string);
    let listing = Listing::for_farmer(
        &farmer,
        &parsed.product_name,
        &parsed.quantity,
        "",
        media_url.is_some(),
    );
    state.store.insert_listing(&listing).await?;
    info!(
        listing_id = %listing.id,
        product = %listing.product_name,
        quantity = %listing.quantity,
        "listing created from whatsapp"
    );

    let confirmation = templates::listing_confirmation(
        &listing.product_name,
        &listing.quantity,
        &listing.quality_grade,
        &farmer.location,
    );

    if let Some(media_url) = media_url {
        state.pipeline.spawn(MediaTask {
            listing_id: listing.id.clone(),
            product_name: listing.product_name.clone(),
            media_url,
            account_id: inbound.account_sid.clone(),
            public_base: base.to_string(),
        });
    }

    Ok(match state.settings.reply_mode {
        ReplyMode::Twiml => reply(&confirmation),
        ReplyMode::Api => {
            send_detached(state, farmer, confirmation);
            twiml(twiml_empty())
        }
    })
}

/// Send the confirmation through the dispatcher after the webhook returns,
/// preferring the identity the farmer just wrote to.
fn send_detached(state: &AppState, farmer: Farmer, body: String) {
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        match notifier.notify_farmer(&farmer, body).await {
            Ok(delivery) => debug!(
                phone = %farmer.phone,
                account_id = delivery.identity.account_id(),
                "listing confirmation sent"
            ),
            Err(e) => warn!(phone = %farmer.phone, error = %e, "listing confirmation failed"),
        }
    });
}

fn signature_is_valid(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
    base: &str,
    params: &BTreeMap<String, String>,
) -> bool {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some(account) = params
        .get("AccountSid")
        .and_then(|sid| state.pool().find_account(sid))
    else {
        return false;
    };
    let path = uri
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_else(|| uri.path());
    let url = format!("{base}{path}");
    validate_signature(account.secret().expose_secret(), &url, params, signature)
}

/// GET /api/whatsapp/test
pub async fn self_test() -> Json<serde_json::Value> {
    Json(json!({ "message": "WhatsApp webhook is working!" }))
}
