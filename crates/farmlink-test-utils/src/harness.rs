// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full HTTP stack (temp SQLite database,
//! provider pool, failover dispatcher, router) over [`MockTransport`] and
//! [`MockGrader`], and drives it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use farmlink_config::FarmlinkConfig;
use farmlink_config::model::{ProviderAccountConfig, ReplyMode};
use farmlink_core::{
    ApprovalStatus, Farmer, FarmerStore, FarmlinkError, GradingStatus, Listing, ListingStore,
};
use farmlink_gateway::AppState;
use farmlink_storage::SqliteStore;
use farmlink_whatsapp::{FailoverDispatcher, ProviderPool};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::mock_grader::MockGrader;
use crate::mock_transport::MockTransport;

/// Bearer token accepted by harness admin routes.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Public URL the harness server claims to be reachable at.
pub const PUBLIC_URL: &str = "https://farmlink.test";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    accounts: Vec<ProviderAccountConfig>,
    reply_mode: ReplyMode,
    admin_token: Option<String>,
    validate_signatures: bool,
    api_base_url: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            accounts: Vec::new(),
            reply_mode: ReplyMode::Twiml,
            admin_token: Some(ADMIN_TOKEN.to_string()),
            validate_signatures: false,
            api_base_url: None,
        }
    }

    /// Add a provider account. Accounts keep declaration order.
    pub fn with_account(mut self, account_sid: &str, auth_token: &str, numbers: &[&str]) -> Self {
        self.accounts.push(ProviderAccountConfig {
            account_sid: Some(account_sid.to_string()),
            auth_token: Some(auth_token.to_string()),
            numbers: numbers.iter().map(|n| n.to_string()).collect(),
        });
        self
    }

    pub fn with_reply_mode(mut self, mode: ReplyMode) -> Self {
        self.reply_mode = mode;
        self
    }

    /// Leave admin routes without a token (every admin call is rejected).
    pub fn without_admin_token(mut self) -> Self {
        self.admin_token = None;
        self
    }

    pub fn with_signature_validation(mut self) -> Self {
        self.validate_signatures = true;
        self
    }

    /// Point the provider API (and so the trusted media host) at `url`.
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = Some(url.to_string());
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, FarmlinkError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| FarmlinkError::Storage { source: e.into() })?;

        let mut config = FarmlinkConfig::default();
        config.storage.database_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        config.server.public_url = Some(PUBLIC_URL.to_string());
        config.whatsapp.accounts = self.accounts;
        config.whatsapp.reply_mode = self.reply_mode;
        config.whatsapp.validate_signatures = self.validate_signatures;
        if let Some(url) = self.api_base_url {
            config.whatsapp.api_base_url = url;
        }
        config.whatsapp.media_dir = temp_dir
            .path()
            .join("uploads")
            .to_string_lossy()
            .to_string();
        config.whatsapp.media_timeout_secs = 5;
        config.admin.bearer_token = self.admin_token;

        let store = Arc::new(SqliteStore::open(&config.storage).await?);
        let pool = Arc::new(ProviderPool::from_configs(config.whatsapp.accounts.clone()));
        let transport = MockTransport::new();
        let grader = MockGrader::new();
        let dispatcher = Arc::new(
            FailoverDispatcher::new(pool.clone(), Arc::new(transport.clone()))
                .with_attempt_timeout(Duration::from_secs(2)),
        );

        let state = AppState::new(&config, store.clone(), dispatcher, Arc::new(grader.clone()))?;
        let router = farmlink_gateway::router(state);

        Ok(TestHarness {
            router,
            store,
            transport,
            grader,
            pool,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A response collected from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("response is not JSON ({e}): {}", self.body))
    }
}

/// A complete HTTP stack over mock collaborators.
pub struct TestHarness {
    pub router: Router,
    pub store: Arc<SqliteStore>,
    pub transport: MockTransport,
    pub grader: MockGrader,
    pub pool: Arc<ProviderPool>,
    pub config: FarmlinkConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Send one request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();
        TestResponse {
            status,
            content_type,
            body: String::from_utf8_lossy(&bytes).to_string(),
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(request(Method::GET, path, false, Body::empty(), None))
            .await
    }

    pub async fn get_admin(&self, path: &str) -> TestResponse {
        self.send(request(Method::GET, path, true, Body::empty(), None))
            .await
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> TestResponse {
        self.send(json_request(Method::POST, path, false, body)).await
    }

    pub async fn post_json_admin(&self, path: &str, body: serde_json::Value) -> TestResponse {
        self.send(json_request(Method::POST, path, true, body)).await
    }

    pub async fn put_json_admin(&self, path: &str, body: serde_json::Value) -> TestResponse {
        self.send(json_request(Method::PUT, path, true, body)).await
    }

    pub async fn delete_admin(&self, path: &str) -> TestResponse {
        self.send(request(Method::DELETE, path, true, Body::empty(), None))
            .await
    }

    /// POST a form-encoded webhook payload.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        self.post_form_with_headers(path, fields, &[]).await
    }

    pub async fn post_form_with_headers(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let encoded = serde_urlencoded::to_string(fields).unwrap_or_default();
        let mut req = request(
            Method::POST,
            path,
            false,
            Body::from(encoded),
            Some("application/x-www-form-urlencoded"),
        );
        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::try_from(*name),
                header::HeaderValue::try_from(*value),
            ) {
                req.headers_mut().insert(name, value);
            }
        }
        self.send(req).await
    }

    /// Insert a farmer directly into storage.
    pub async fn seed_farmer(&self, name: &str, phone: &str, active: bool) -> Farmer {
        let mut farmer = Farmer::register(name, phone, "Hosur", "Krishnagiri", "tomato");
        if active {
            farmer.approval_status = ApprovalStatus::Approved;
            farmer.is_active = true;
        }
        self.store
            .insert_farmer(&farmer)
            .await
            .unwrap_or_else(|e| panic!("seed farmer: {e}"));
        farmer
    }

    /// Poll until the listing's grading job has settled.
    pub async fn wait_for_grading(&self, listing_id: &str) -> Listing {
        for _ in 0..250 {
            if let Ok(Some(listing)) = self.store.get_listing(listing_id).await
                && listing.grading_status != GradingStatus::Pending
            {
                return listing;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("grading for {listing_id} did not settle");
    }
}

fn request(
    method: Method,
    path: &str,
    admin: bool,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::HOST, "farmlink.test");
    if admin {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder
        .body(body)
        .unwrap_or_else(|e| panic!("invalid test request: {e}"))
}

fn json_request(method: Method, path: &str, admin: bool, body: serde_json::Value) -> Request<Body> {
    request(
        method,
        path,
        admin,
        Body::from(body.to_string()),
        Some("application/json"),
    )
}
