// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marketplace routes under `/api/products`.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use farmlink_core::{Listing, ListingStatus, OrderDetails, types::now_timestamp};
use farmlink_whatsapp::templates;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::handlers::{canonical_phone, present, public_base};
use crate::state::AppState;

/// Most listings returned by the marketplace feed.
pub const FEED_LIMIT: i64 = 50;

const DEFAULT_BUYER_NAME: &str = "Anonymous Buyer";

#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    pub success: bool,
    pub count: usize,
    pub products: Vec<Listing>,
}

impl From<Vec<Listing>> for ListingsResponse {
    fn from(products: Vec<Listing>) -> Self {
        Self {
            success: true,
            count: products.len(),
            products,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub product: Listing,
    /// Outcome of the farmer notification, on orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub buyer_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateListingRequest {
    #[serde(default)]
    pub farmer_phone: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// GET /api/products
pub async fn list(State(state): State<AppState>) -> Result<Json<ListingsResponse>, ApiError> {
    let products = state.store.list_available(FEED_LIMIT).await?;
    Ok(Json(products.into()))
}

/// GET /api/products/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListingResponse>, ApiError> {
    let product = state
        .store
        .get_listing(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(ListingResponse {
        success: true,
        message: None,
        product,
        notification: None,
    }))
}

/// POST /api/products/order/{id}
///
/// The order stands even when the farmer cannot be notified.
pub async fn order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<OrderRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    let listing = state
        .store
        .get_listing(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    if listing.status != ListingStatus::Available {
        return Err(ApiError::bad_request("Product is no longer available"));
    }

    let order = OrderDetails {
        buyer_name: present(&body.buyer_name)
            .unwrap_or(DEFAULT_BUYER_NAME)
            .to_string(),
        buyer_phone: present(&body.buyer_phone).unwrap_or_default().to_string(),
        ordered_at: now_timestamp(),
    };
    let Some(product) = state.store.mark_ordered(&id, &order).await? else {
        return Err(ApiError::bad_request("Product is no longer available"));
    };
    info!(listing_id = %id, buyer = %order.buyer_name, "order placed");

    let alert = templates::order_alert(
        &product.product_name,
        &product.quantity,
        &order.buyer_name,
        &order.buyer_phone,
    );
    let sent = match state.store.find_farmer_by_phone(&product.farmer_phone).await {
        Ok(Some(farmer)) => state.notifier.notify_farmer(&farmer, alert).await,
        Ok(None) => state.notifier.notify_address(&product.farmer_phone, alert).await,
        Err(e) => {
            warn!(error = %e, "farmer lookup failed, notifying without affinity");
            state.notifier.notify_address(&product.farmer_phone, alert).await
        }
    };
    let notification = match sent {
        Ok(delivery) => {
            info!(
                listing_id = %id,
                account_id = delivery.identity.account_id(),
                message_id = %delivery.message_id,
                "order alert sent"
            );
            "sent"
        }
        Err(e) => {
            warn!(listing_id = %id, error = %e, "order alert failed");
            "failed"
        }
    };

    Ok(Json(ListingResponse {
        success: true,
        message: Some("Order placed successfully!".to_string()),
        product,
        notification: Some(notification),
    }))
}

/// GET /api/products/farmer/{phone}
pub async fn by_farmer(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<ListingsResponse>, ApiError> {
    let products = state.store.list_by_farmer(&canonical_phone(&phone)).await?;
    Ok(Json(products.into()))
}

/// POST /api/products/create
///
/// A listing created with an image is graded in the background.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<ListingResponse>), ApiError> {
    let (Some(phone), Some(product_name), Some(quantity)) = (
        present(&body.farmer_phone),
        present(&body.product_name),
        present(&body.quantity),
    ) else {
        return Err(ApiError::bad_request(
            "Farmer phone, product name, and quantity are required",
        ));
    };

    let farmer = state
        .store
        .find_farmer_by_phone(&canonical_phone(phone))
        .await?
        .ok_or_else(|| {
            ApiError::not_found("Farmer not found. Please add farmer first in admin panel.")
        })?;

    let image_url = present(&body.image_url).unwrap_or_default();
    let has_image = !image_url.is_empty();
    let listing = Listing::for_farmer(&farmer, product_name, quantity, image_url, has_image);
    state.store.insert_listing(&listing).await?;
    info!(listing_id = %listing.id, farmer = %farmer.phone, "listing created manually");

    if has_image {
        let absolute = if image_url.starts_with('/') {
            format!("{}{image_url}", public_base(&state, &headers))
        } else {
            image_url.to_string()
        };
        state.pipeline.grading().spawn(
            listing.id.clone(),
            absolute,
            listing.product_name.clone(),
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(ListingResponse {
            success: true,
            message: Some("Product created successfully!".to_string()),
            product: listing,
            notification: None,
        }),
    ))
}
