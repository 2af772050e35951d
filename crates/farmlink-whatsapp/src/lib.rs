// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp delivery for FarmLink.
//!
//! Outbound messages go through a [`FailoverDispatcher`] that walks a
//! [`ProviderPool`] of provider accounts, preferring the identity a farmer
//! last wrote to ([`AffinityResolver`]) and failing over on account or
//! number problems. Inbound support covers webhook payload parsing, TwiML
//! replies, signature checks and media download.

pub mod address;
pub mod affinity;
pub mod dispatcher;
pub mod error;
pub mod media;
pub mod notifier;
pub mod pool;
pub mod templates;
pub mod transport;
pub mod twilio;
pub mod webhook;

pub use address::{channel_address, normalize, to_channel_address};
pub use affinity::AffinityResolver;
pub use dispatcher::{Delivery, FailoverDispatcher, OutboundMessage};
pub use error::{DeliveryError, FaultScope, ProviderFault};
pub use media::MediaDownloader;
pub use notifier::FarmerNotifier;
pub use pool::{
    AccountSource, ConfigAccounts, ProviderAccount, ProviderPool, SendIdentity, StaticAccounts,
};
pub use transport::MessagingTransport;
pub use twilio::TwilioTransport;
pub use webhook::InboundMessage;
