// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery failure taxonomy.
//!
//! A transport reports a [`ProviderFault`] for one attempt. The dispatcher
//! folds faults into a [`DeliveryError`] for the whole send.

use std::time::Duration;

use strum::Display;
use thiserror::Error;

/// What a provider failure says is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FaultScope {
    /// The account cannot send right now (auth, suspension, balance, rate
    /// limit, outage). Skip the account's remaining numbers.
    Account,
    /// This sending number is unusable but the account may have others.
    Number,
    /// The message or recipient is unsendable from any identity.
    Message,
}

/// One failed transmission attempt as reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_fault(.code, .message))]
pub struct ProviderFault {
    pub scope: FaultScope,
    /// Machine-readable provider error code, when the provider sent one.
    pub code: Option<u32>,
    pub message: String,
}

fn render_fault(code: &Option<u32>, message: &str) -> String {
    match code {
        Some(code) => format!("[{code}] {message}"),
        None => message.to_string(),
    }
}

impl ProviderFault {
    pub fn new(scope: FaultScope, code: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            scope,
            code,
            message: message.into(),
        }
    }

    pub fn account(message: impl Into<String>) -> Self {
        Self::new(FaultScope::Account, None, message)
    }

    /// An attempt that did not finish within `limit`.
    pub fn timed_out(limit: Duration) -> Self {
        Self::account(format!("send attempt timed out after {limit:?}"))
    }
}

/// Final failure of a delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The destination could not be read as a phone number. Never retried.
    #[error("invalid address `{0}`")]
    InvalidAddress(String),

    /// Every candidate identity failed with an account or number problem.
    /// Carries the last failure observed.
    #[error("transient provider failure via {account_id} ({from}): {fault}")]
    TransientProvider {
        account_id: String,
        from: String,
        fault: ProviderFault,
    },

    /// The provider rejected the message itself.
    #[error("message rejected via {account_id} ({from}): {fault}")]
    PermanentMessage {
        account_id: String,
        from: String,
        fault: ProviderFault,
    },

    /// The pool was empty, including after a reload.
    #[error("no messaging provider configured")]
    NoProviderConfigured,
}

impl DeliveryError {
    /// Provider error code behind this failure, if any.
    pub fn provider_code(&self) -> Option<u32> {
        match self {
            Self::TransientProvider { fault, .. } | Self::PermanentMessage { fault, .. } => {
                fault.code
            }
            _ => None,
        }
    }
}
