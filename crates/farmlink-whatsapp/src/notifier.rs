// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Affinity-aware notifications to farmers.

use std::sync::Arc;

use farmlink_core::Farmer;

use crate::affinity::AffinityResolver;
use crate::dispatcher::{Delivery, FailoverDispatcher, OutboundMessage};
use crate::error::DeliveryError;

/// Sends a message to a farmer from the identity they last wrote to,
/// failing over through the rest of the pool.
#[derive(Debug, Clone)]
pub struct FarmerNotifier {
    resolver: AffinityResolver,
    dispatcher: Arc<FailoverDispatcher>,
}

impl FarmerNotifier {
    pub fn new(dispatcher: Arc<FailoverDispatcher>) -> Self {
        Self {
            resolver: AffinityResolver::new(dispatcher.pool().clone()),
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Arc<FailoverDispatcher> {
        &self.dispatcher
    }

    /// Notify a known farmer, preferring their recorded identity.
    pub async fn notify_farmer(
        &self,
        farmer: &Farmer,
        body: impl Into<String>,
    ) -> Result<Delivery, DeliveryError> {
        let preferred = self.resolver.resolve_preferred(farmer);
        let message = OutboundMessage::new(&farmer.phone, body).preferring(preferred.as_ref());
        self.dispatcher.send(&message).await
    }

    /// Notify an address with no farmer record, in plain pool order.
    pub async fn notify_address(
        &self,
        to: &str,
        body: impl Into<String>,
    ) -> Result<Delivery, DeliveryError> {
        self.dispatcher.send(&OutboundMessage::new(to, body)).await
    }
}
