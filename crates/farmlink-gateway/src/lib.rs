// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the FarmLink marketplace.
//!
//! Receives the WhatsApp webhook, serves the marketplace and the farmer
//! administration routes, and exposes health and provider diagnostics.
//! Outbound notifications (order alerts, welcome messages) go through the
//! affinity-aware failover dispatcher of `farmlink-whatsapp`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use pipeline::{MediaPipeline, MediaTask};
pub use server::{router, serve};
pub use state::{AppState, GatewaySettings};
