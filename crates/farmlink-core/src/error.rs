// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the FarmLink workspace.

use thiserror::Error;

/// The primary error type for storage, grading, and API operations.
///
/// Outbound WhatsApp delivery has its own taxonomy (`DeliveryError` in
/// `farmlink-whatsapp`) because delivery failures are values the caller
/// inspects, not faults that abort a request.
#[derive(Debug, Error)]
pub enum FarmlinkError {
    /// Configuration errors (invalid TOML, unreadable files, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A record addressed by id or phone does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The request conflicts with the current state of a record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller-supplied input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The external grading service failed or returned an unusable answer.
    #[error("grading error: {message}")]
    Grading {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound HTTP failures outside the delivery path (media downloads).
    #[error("http error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FarmlinkError {
    /// Shorthand for a [`FarmlinkError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
