// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers, one module per route group.

pub mod diagnostics;
pub mod farmers;
pub mod products;
pub mod webhook;

use axum::http::HeaderMap;
use farmlink_whatsapp::normalize;

use crate::state::AppState;

/// Externally visible base URL: the configured public URL, else derived
/// from the forwarding and `Host` headers.
pub(crate) fn public_base(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.settings.public_url {
        return url.clone();
    }
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let proto = header("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = header("x-forwarded-host")
        .or_else(|| header("host"))
        .unwrap_or_else(|| "localhost".to_string());
    format!("{proto}://{host}")
}

/// Canonical phone for lookups, or the trimmed input when it is not a number.
pub(crate) fn canonical_phone(raw: &str) -> String {
    normalize(raw).unwrap_or_else(|_| raw.trim().to_string())
}

/// `Some(value)` when the field is present and not blank.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
