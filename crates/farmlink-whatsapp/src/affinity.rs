// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Picks the identity a farmer last wrote to, so replies continue the same
//! conversation.

use std::sync::Arc;

use farmlink_core::{Farmer, FarmerAffinity};

use crate::pool::{ProviderPool, SendIdentity};

/// Resolves a farmer's recorded affinity against the current pool.
#[derive(Debug, Clone)]
pub struct AffinityResolver {
    pool: Arc<ProviderPool>,
}

impl AffinityResolver {
    pub fn new(pool: Arc<ProviderPool>) -> Self {
        Self { pool }
    }

    /// Preferred identity for `farmer`, or `None` to use pool order.
    pub fn resolve_preferred(&self, farmer: &Farmer) -> Option<SendIdentity> {
        self.resolve(&farmer.affinity())
    }

    /// Resolution rules:
    /// - a recorded account id wins; if that account left the pool there is
    ///   no preference
    /// - within the account, the recorded number if still bound, else the
    ///   account's first number
    /// - with only a number recorded, the account that owns it
    pub fn resolve(&self, affinity: &FarmerAffinity) -> Option<SendIdentity> {
        let address = affinity.last_inbound_address.as_deref();

        let account = match affinity.last_provider_account_id.as_deref() {
            Some(id) => self.pool.find_account(id)?,
            None => self.pool.owner_of(address?)?,
        };

        let from = address
            .filter(|a| account.owns(a))
            .and_then(|a| crate::address::channel_address(a).ok())
            .or_else(|| account.numbers().first().cloned())?;

        Some(SendIdentity { account, from })
    }
}
