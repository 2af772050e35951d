// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock grading service with queued answers.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use farmlink_core::{FarmlinkError, GradeResult, GradingService};

#[derive(Default)]
struct State {
    answers: VecDeque<Option<GradeResult>>,
    requests: Vec<(String, String)>,
}

/// A [`GradingService`] that answers from a FIFO queue.
///
/// `None` entries fail the call. When the queue is empty every call
/// returns `Grade A` / 90.
#[derive(Clone, Default)]
pub struct MockGrader {
    state: Arc<Mutex<State>>,
}

impl MockGrader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful grade.
    pub async fn push_grade(&self, grade: &str, score: f64) {
        self.state.lock().await.answers.push_back(Some(GradeResult {
            grade: grade.to_string(),
            score,
        }));
    }

    /// Queue a failed call.
    pub async fn push_failure(&self) {
        self.state.lock().await.answers.push_back(None);
    }

    /// `(image_url, product_name)` of every call so far.
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().await.requests.clone()
    }
}

#[async_trait]
impl GradingService for MockGrader {
    async fn grade(
        &self,
        image_url: &str,
        product_name: &str,
    ) -> Result<GradeResult, FarmlinkError> {
        let mut state = self.state.lock().await;
        state
            .requests
            .push((image_url.to_string(), product_name.to_string()));
        match state.answers.pop_front() {
            Some(Some(grade)) => Ok(grade),
            Some(None) => Err(FarmlinkError::Grading {
                message: "mock grading failure".to_string(),
                source: None,
            }),
            None => Ok(GradeResult {
                grade: "Grade A".to_string(),
                score: 90.0,
            }),
        }
    }
}
