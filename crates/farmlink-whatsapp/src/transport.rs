// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The seam between the dispatcher and a provider's send API.

use async_trait::async_trait;

use crate::error::ProviderFault;
use crate::pool::ProviderAccount;

/// Sends one message through one identity.
///
/// Implementations classify every failure into a [`ProviderFault`] scope;
/// they never retry on their own.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Transmit `body` from `from` to `to` (both channel addresses) using
    /// `account`'s credentials. Returns the provider message id.
    async fn transmit(
        &self,
        account: &ProviderAccount,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<String, ProviderFault>;
}
