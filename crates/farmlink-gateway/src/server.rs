// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the API.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use farmlink_core::FarmlinkError;
use farmlink_whatsapp::media::MEDIA_URL_PREFIX;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::require_admin;
use crate::handlers::{diagnostics, farmers, products, webhook};
use crate::state::AppState;

/// Build the application router.
///
/// - Public: webhook, marketplace, farmer registration, health, `/uploads`
/// - Admin (bearer token): farmer administration, provider diagnostics
pub fn router(state: AppState) -> Router {
    let admin = state.settings.admin.clone();
    let media_dir = state.settings.media_dir.clone();

    let public_routes = Router::new()
        .route("/api/health", get(diagnostics::health))
        .route("/api/whatsapp", post(webhook::receive))
        .route("/api/whatsapp/test", get(webhook::self_test))
        .route("/api/products", get(products::list))
        .route("/api/products/create", post(products::create))
        .route("/api/products/order/{id}", post(products::order))
        .route("/api/products/farmer/{phone}", get(products::by_farmer))
        .route("/api/products/{id}", get(products::get))
        .route("/api/farmers/register", post(farmers::register))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/api/farmers", get(farmers::list))
        .route("/api/farmers/approve/{id}", post(farmers::approve))
        .route("/api/farmers/reject/{id}", post(farmers::reject))
        .route("/api/farmers/{id}", put(farmers::update).delete(farmers::delete))
        .route(
            "/api/test-twilio",
            get(diagnostics::provider_status).post(diagnostics::send_test),
        )
        .route_layer(axum_middleware::from_fn_with_state(admin, require_admin))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .nest_service(MEDIA_URL_PREFIX, ServeDir::new(media_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve `app` on `host:port` until `shutdown` is cancelled, then drain
/// in-flight requests.
pub async fn serve(
    host: &str,
    port: u16,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), FarmlinkError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FarmlinkError::Http {
            message: format!("failed to bind server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("FarmLink server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| FarmlinkError::Http {
            message: format!("server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("server stopped");
    Ok(())
}
