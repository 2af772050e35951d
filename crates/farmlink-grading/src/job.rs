// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detached grading of a stored listing.
//!
//! A job never reports failure to its caller: the listing ends up either
//! `graded` with the service's answer or `default` with the default grade,
//! and never stays `pending`.

use std::sync::Arc;

use farmlink_core::{GradeResult, GradingService, StorageAdapter};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How a grading job settled its listing.
#[derive(Debug, Clone, PartialEq)]
pub enum GradingOutcome {
    Graded(GradeResult),
    Defaulted,
}

/// Runs grading requests against the grading service and stores the result.
#[derive(Clone)]
pub struct GradingJob {
    store: Arc<dyn StorageAdapter>,
    grader: Arc<dyn GradingService>,
}

impl GradingJob {
    pub fn new(store: Arc<dyn StorageAdapter>, grader: Arc<dyn GradingService>) -> Self {
        Self { store, grader }
    }

    /// Grade `listing_id` from the photo at `image_url`.
    pub async fn run(&self, listing_id: &str, image_url: &str, product_name: &str) -> GradingOutcome {
        match self.grader.grade(image_url, product_name).await {
            Ok(grade) => match self.store.record_grade(listing_id, &grade).await {
                Ok(()) => {
                    info!(
                        listing_id,
                        grade = %grade.grade,
                        score = grade.score,
                        "listing graded"
                    );
                    GradingOutcome::Graded(grade)
                }
                Err(e) => {
                    warn!(listing_id, error = %e, "failed to store grade");
                    self.settle(listing_id).await
                }
            },
            Err(e) => {
                warn!(listing_id, error = %e, "grading failed, keeping default grade");
                self.settle(listing_id).await
            }
        }
    }

    /// Settle `listing_id` on the default grade without calling the service.
    pub async fn settle(&self, listing_id: &str) -> GradingOutcome {
        if let Err(e) = self.store.settle_default_grade(listing_id).await {
            warn!(listing_id, error = %e, "failed to settle default grade");
        }
        GradingOutcome::Defaulted
    }

    /// Run [`GradingJob::run`] on a background task.
    pub fn spawn(
        &self,
        listing_id: String,
        image_url: String,
        product_name: String,
    ) -> JoinHandle<GradingOutcome> {
        let job = self.clone();
        tokio::spawn(async move { job.run(&listing_id, &image_url, &product_name).await })
    }
}

impl std::fmt::Debug for GradingJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradingJob").finish_non_exhaustive()
    }
}
