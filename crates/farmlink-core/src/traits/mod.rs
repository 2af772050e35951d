// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams between the service and its collaborators.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod grading;
pub mod storage;

pub use grading::GradingService;
pub use storage::{FarmerStore, ListingStore, StorageAdapter};
