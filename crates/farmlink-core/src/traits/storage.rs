// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for farmer and listing records.

use async_trait::async_trait;

use crate::error::FarmlinkError;
use crate::types::{
    ApprovalStatus, Farmer, FarmerAffinity, GradeResult, HealthStatus, Listing, OrderDetails,
};

/// CRUD over farmer records.
#[async_trait]
pub trait FarmerStore: Send + Sync {
    /// Insert a new farmer. Fails with `Conflict` when the phone is taken.
    async fn insert_farmer(&self, farmer: &Farmer) -> Result<(), FarmlinkError>;

    async fn get_farmer(&self, id: &str) -> Result<Option<Farmer>, FarmlinkError>;

    /// Look up a farmer by canonical phone number.
    async fn find_farmer_by_phone(&self, phone: &str) -> Result<Option<Farmer>, FarmlinkError>;

    /// List farmers newest first, optionally filtered by approval status.
    async fn list_farmers(
        &self,
        status: Option<ApprovalStatus>,
    ) -> Result<Vec<Farmer>, FarmlinkError>;

    /// Overwrite every mutable column of an existing farmer.
    async fn update_farmer(&self, farmer: &Farmer) -> Result<(), FarmlinkError>;

    /// Replace the recorded affinity of the farmer with `phone`.
    async fn record_affinity(
        &self,
        phone: &str,
        affinity: &FarmerAffinity,
    ) -> Result<(), FarmlinkError>;

    async fn mark_welcome_sent(&self, id: &str, sent_at: &str) -> Result<(), FarmlinkError>;

    /// Delete a farmer. Returns `false` when no row matched.
    async fn delete_farmer(&self, id: &str) -> Result<bool, FarmlinkError>;
}

/// CRUD over marketplace listings.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert_listing(&self, listing: &Listing) -> Result<(), FarmlinkError>;

    async fn get_listing(&self, id: &str) -> Result<Option<Listing>, FarmlinkError>;

    /// Available listings, newest first.
    async fn list_available(&self, limit: i64) -> Result<Vec<Listing>, FarmlinkError>;

    /// All listings of one farmer, newest first.
    async fn list_by_farmer(&self, phone: &str) -> Result<Vec<Listing>, FarmlinkError>;

    /// Atomically move an available listing to `ordered`.
    ///
    /// Returns `None` when the listing is missing or no longer available.
    async fn mark_ordered(
        &self,
        id: &str,
        order: &OrderDetails,
    ) -> Result<Option<Listing>, FarmlinkError>;

    async fn set_image_url(&self, id: &str, image_url: &str) -> Result<(), FarmlinkError>;

    /// Store a grade from the grading service and mark the listing graded.
    async fn record_grade(&self, id: &str, grade: &GradeResult) -> Result<(), FarmlinkError>;

    /// Settle a pending grading job on the default grade.
    async fn settle_default_grade(&self, id: &str) -> Result<(), FarmlinkError>;
}

/// A complete storage backend for the marketplace.
#[async_trait]
pub trait StorageAdapter: FarmerStore + ListingStore {
    /// Check that the backend can serve queries.
    async fn health_check(&self) -> Result<HealthStatus, FarmlinkError>;

    /// Flush and release the backend.
    async fn close(&self) -> Result<(), FarmlinkError>;
}
