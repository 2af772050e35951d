// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio Programmable Messaging transport.
//!
//! Sends through `POST /2010-04-01/Accounts/{sid}/Messages.json` with the
//! account's SID and auth token as HTTP basic auth, and maps Twilio error
//! codes onto [`FaultScope`]s.

use std::time::Duration;

use async_trait::async_trait;
use farmlink_core::FarmlinkError;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use crate::error::{FaultScope, ProviderFault};
use crate::pool::ProviderAccount;
use crate::transport::MessagingTransport;

/// Production Twilio REST endpoint.
pub const TWILIO_API_BASE_URL: &str = "https://api.twilio.com";

/// Error codes that mean the account itself cannot send: bad credentials,
/// suspended or closed account, rate or balance limits, sandbox/business
/// profile restrictions.
const ACCOUNT_CODES: &[u32] = &[20003, 20005, 20404, 20429, 21408, 21608, 63018, 63038];

/// Error codes that mean one sending number is unusable, including 63016
/// (no open session window from this sender to the recipient).
const NUMBER_CODES: &[u32] = &[21212, 21606, 63007, 63016];

/// Error codes that mean the message or recipient is unsendable.
const MESSAGE_CODES: &[u32] = &[21211, 21614, 21610, 21617, 21602];

#[derive(Debug, Deserialize)]
struct MessageCreated {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<u32>,
    message: Option<String>,
}

/// [`MessagingTransport`] over the Twilio REST API.
#[derive(Debug, Clone)]
pub struct TwilioTransport {
    client: reqwest::Client,
    base_url: String,
}

impl TwilioTransport {
    /// Build a transport whose HTTP client gives up after `request_timeout`.
    pub fn new(request_timeout: Duration) -> Result<Self, FarmlinkError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| FarmlinkError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: TWILIO_API_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL (regional endpoints, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self, account_id: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{account_id}/Messages.json",
            self.base_url
        )
    }
}

#[async_trait]
impl MessagingTransport for TwilioTransport {
    async fn transmit(
        &self,
        account: &ProviderAccount,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<String, ProviderFault> {
        let response = self
            .client
            .post(self.messages_url(account.id()))
            .basic_auth(account.id(), Some(account.secret().expose_secret()))
            .form(&[("From", from), ("To", to), ("Body", body)])
            .send()
            .await
            .map_err(|e| ProviderFault::account(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, account_id = account.id(), "twilio response received");

        if status.is_success() {
            let created: MessageCreated = response.json().await.map_err(|e| {
                ProviderFault::account(format!("unreadable success response: {e}"))
            })?;
            return Ok(created.sid);
        }

        let text = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorBody>(&text).ok();
        let code = parsed.as_ref().and_then(|b| b.code);
        let message = parsed
            .and_then(|b| b.message)
            .unwrap_or_else(|| format!("Twilio returned {status}: {text}"));

        Err(ProviderFault::new(classify(code), code, message))
    }
}

/// Map a Twilio error code onto the failure scope.
///
/// Unknown codes and responses without a code are account-scoped.
pub fn classify(code: Option<u32>) -> FaultScope {
    if let Some(code) = code {
        if MESSAGE_CODES.contains(&code) {
            return FaultScope::Message;
        }
        if NUMBER_CODES.contains(&code) {
            return FaultScope::Number;
        }
        if ACCOUNT_CODES.contains(&code) {
            return FaultScope::Account;
        }
    }
    FaultScope::Account
}
