// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the FarmLink marketplace.
//!
//! This crate provides the domain records (farmers, listings, affinity),
//! the service-wide error type, the listing message parser, and the adapter
//! traits implemented by the storage and grading crates.

pub mod error;
pub mod listing;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FarmlinkError;
pub use listing::{ListingParseError, ParsedListing, parse_listing};
pub use traits::{FarmerStore, GradingService, ListingStore, StorageAdapter};
pub use types::{
    ApprovalStatus, DEFAULT_QUALITY_GRADE, DEFAULT_QUALITY_SCORE, Farmer, FarmerAffinity,
    GradeResult, GradingStatus, HealthStatus, Listing, ListingStatus, OrderDetails,
};
