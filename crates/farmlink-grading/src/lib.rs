// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Produce quality grading for FarmLink listings.
//!
//! [`GradingClient`] is the HTTP client for the external grading service.
//! [`GradingJob`] runs one grading request for a stored listing as a
//! detached task and always leaves the listing with a settled grade.

pub mod client;
pub mod job;

pub use client::GradingClient;
pub use job::{GradingJob, GradingOutcome};
