// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for FarmLink integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a messaging provider or grading service.
//!
//! # Components
//!
//! - [`MockTransport`] - scripted per-identity provider responses, with call recording
//! - [`MockGrader`] - grading service with queued answers
//! - [`TestHarness`] - storage, dispatcher and router wired over the mocks

pub mod harness;
pub mod mock_grader;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_grader::MockGrader;
pub use mock_transport::{MockTransport, SentMessage};
