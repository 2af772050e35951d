// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detached media handling for listings created with a photo.
//!
//! Runs after the webhook has replied: download the photo with the
//! receiving account's credentials, point the listing at the stored copy,
//! then grade it. Every failure path settles the listing's grade.

use std::sync::Arc;

use farmlink_core::StorageAdapter;
use farmlink_grading::{GradingJob, GradingOutcome};
use farmlink_whatsapp::{MediaDownloader, ProviderPool};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One photo to fetch and grade.
#[derive(Debug, Clone)]
pub struct MediaTask {
    pub listing_id: String,
    pub product_name: String,
    /// Provider-hosted media URL (`MediaUrl0`).
    pub media_url: String,
    /// Account that received the message; its credentials fetch the media.
    pub account_id: Option<String>,
    /// Base URL the grading service uses to reach `/uploads`.
    pub public_base: String,
}

#[derive(Clone)]
pub struct MediaPipeline {
    store: Arc<dyn StorageAdapter>,
    pool: Arc<ProviderPool>,
    media: MediaDownloader,
    grading: GradingJob,
}

impl MediaPipeline {
    pub fn new(
        store: Arc<dyn StorageAdapter>,
        pool: Arc<ProviderPool>,
        media: MediaDownloader,
        grading: GradingJob,
    ) -> Self {
        Self {
            store,
            pool,
            media,
            grading,
        }
    }

    pub fn grading(&self) -> &GradingJob {
        &self.grading
    }

    pub fn spawn(&self, task: MediaTask) -> JoinHandle<GradingOutcome> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.run(task).await })
    }

    pub async fn run(&self, task: MediaTask) -> GradingOutcome {
        let account = task
            .account_id
            .as_deref()
            .and_then(|id| self.pool.find_account(id));
        if task.account_id.is_some() && account.is_none() {
            debug!(listing_id = %task.listing_id, "receiving account not in pool, fetching media without auth");
        }

        let public_path = match self.media.download(&task.media_url, account.as_deref()).await {
            Ok(path) => path,
            Err(e) => {
                warn!(listing_id = %task.listing_id, error = %e, "media download failed");
                return self.grading.settle(&task.listing_id).await;
            }
        };

        if let Err(e) = self.store.set_image_url(&task.listing_id, &public_path).await {
            warn!(listing_id = %task.listing_id, error = %e, "failed to store image url");
        }

        let image_url = format!("{}{public_path}", task.public_base);
        self.grading
            .run(&task.listing_id, &image_url, &task.product_name)
            .await
    }
}

impl std::fmt::Debug for MediaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPipeline")
            .field("media", &self.media)
            .finish_non_exhaustive()
    }
}
