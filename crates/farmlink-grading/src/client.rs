// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the grading service: `POST {service_url}/grade`.

use std::time::Duration;

use async_trait::async_trait;
use farmlink_config::model::GradingConfig;
use farmlink_core::{FarmlinkError, GradeResult, GradingService};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct GradeRequest<'a> {
    image_url: &'a str,
    product_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct GradeResponse {
    #[serde(default)]
    grade: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

/// [`GradingService`] backed by the external grading HTTP API.
#[derive(Debug, Clone)]
pub struct GradingClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl GradingClient {
    pub fn new(config: &GradingConfig) -> Result<Self, FarmlinkError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FarmlinkError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/grade", config.service_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GradingService for GradingClient {
    async fn grade(
        &self,
        image_url: &str,
        product_name: &str,
    ) -> Result<GradeResult, FarmlinkError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GradeRequest {
                image_url,
                product_name,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FarmlinkError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    FarmlinkError::Grading {
                        message: format!("grading request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, "grading response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FarmlinkError::Grading {
                message: format!("grading service returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: GradeResponse = response.json().await.map_err(|e| FarmlinkError::Grading {
            message: format!("unreadable grading response: {e}"),
            source: Some(Box::new(e)),
        })?;

        match parsed.grade.filter(|g| !g.trim().is_empty()) {
            Some(grade) => Ok(GradeResult {
                grade,
                score: parsed.score.unwrap_or(0.0),
            }),
            None => Err(FarmlinkError::Grading {
                message: "grading response carried no grade".to_string(),
                source: None,
            }),
        }
    }
}
