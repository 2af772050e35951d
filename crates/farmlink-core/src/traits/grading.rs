// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grading service trait for AI quality assessment of produce photos.

use async_trait::async_trait;

use crate::error::FarmlinkError;
use crate::types::GradeResult;

/// A single request/response call to the external grading service.
#[async_trait]
pub trait GradingService: Send + Sync {
    /// Grade the produce shown at `image_url`.
    async fn grade(&self, image_url: &str, product_name: &str)
    -> Result<GradeResult, FarmlinkError>;
}
