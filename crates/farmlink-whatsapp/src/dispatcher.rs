// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failover dispatcher.
//!
//! One [`FailoverDispatcher::send`] call walks the candidate identities in
//! priority order and stops at the first success. Failures are handled by
//! scope:
//!
//! | scope     | effect                                        |
//! |-----------|-----------------------------------------------|
//! | `Message` | abort the whole call, no other identity tried |
//! | `Number`  | try the account's next number                 |
//! | `Account` | skip the account's remaining numbers          |
//!
//! When a pass ends with nothing but account/number failures, the pool is
//! reloaded once and the ordering is walked once more. A single call
//! therefore makes at most two passes and at most one reload.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::address;
use crate::error::{DeliveryError, FaultScope, ProviderFault};
use crate::pool::{ProviderAccount, ProviderPool, SendIdentity};
use crate::transport::MessagingTransport;

/// Default upper bound for one transmission attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

/// A message to deliver, with an optional preferred identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: String,
    /// Destination phone or channel address.
    pub to: String,
    pub preferred_from: Option<String>,
    pub preferred_account_id: Option<String>,
}

impl OutboundMessage {
    pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            to: to.into(),
            preferred_from: None,
            preferred_account_id: None,
        }
    }

    /// Prefer `identity` for this message.
    pub fn preferring(mut self, identity: Option<&SendIdentity>) -> Self {
        if let Some(identity) = identity {
            self.preferred_from = Some(identity.from.clone());
            self.preferred_account_id = Some(identity.account_id().to_string());
        }
        self
    }
}

/// A successful delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The identity that transmitted the message.
    pub identity: SendIdentity,
    /// Provider-assigned message id.
    pub message_id: String,
    /// Transmission attempts made, including the successful one.
    pub attempts: u32,
    /// Whether the pool was reloaded during this call.
    pub reinitialized: bool,
}

/// Sends messages through the pool with affinity-first ordering and failover.
pub struct FailoverDispatcher {
    pool: Arc<ProviderPool>,
    transport: Arc<dyn MessagingTransport>,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for FailoverDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverDispatcher")
            .field("pool", &self.pool)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

/// Result of walking the candidate ordering once.
enum Pass {
    Delivered(Delivery),
    Rejected(DeliveryError),
    Exhausted,
}

/// Per-call bookkeeping shared by both passes.
struct Attempts {
    count: u32,
    last_failure: Option<DeliveryError>,
    reinitialized: bool,
}

impl FailoverDispatcher {
    pub fn new(pool: Arc<ProviderPool>, transport: Arc<dyn MessagingTransport>) -> Self {
        Self {
            pool,
            transport,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &Arc<ProviderPool> {
        &self.pool
    }

    /// Deliver `message`, failing over across identities.
    ///
    /// Provider failures never escape as anything but a [`DeliveryError`].
    pub async fn send(&self, message: &OutboundMessage) -> Result<Delivery, DeliveryError> {
        let to = address::channel_address(&message.to)?;
        let mut state = Attempts {
            count: 0,
            last_failure: None,
            reinitialized: false,
        };

        let mut accounts = self.pool.accounts();
        if accounts.is_empty() {
            accounts = self.reload(&mut state);
            if accounts.is_empty() {
                error!(to = %to, "no messaging provider configured, message not sent");
                return Err(DeliveryError::NoProviderConfigured);
            }
        }

        loop {
            let pass = if state.reinitialized { 2 } else { 1 };
            match self.sweep(&accounts, message, &to, pass, &mut state).await {
                Pass::Delivered(delivery) => return Ok(delivery),
                Pass::Rejected(err) => return Err(err),
                Pass::Exhausted if state.reinitialized => break,
                Pass::Exhausted => {
                    warn!(
                        to = %to,
                        attempts = state.count,
                        "all identities failed, reloading provider accounts"
                    );
                    accounts = self.reload(&mut state);
                    if accounts.is_empty() {
                        error!(to = %to, "provider pool empty after reload, message not sent");
                        return Err(DeliveryError::NoProviderConfigured);
                    }
                }
            }
        }

        let err = state
            .last_failure
            .unwrap_or(DeliveryError::NoProviderConfigured);
        error!(to = %to, attempts = state.count, error = %err, "delivery failed on every identity");
        Err(err)
    }

    /// Reload the pool once and return the accounts now in effect.
    fn reload(&self, state: &mut Attempts) -> Arc<Vec<Arc<ProviderAccount>>> {
        state.reinitialized = true;
        if let Ok(count) = self.pool.reinitialize() {
            info!(accounts = count, "provider accounts reloaded");
        }
        self.pool.accounts()
    }

    async fn sweep(
        &self,
        accounts: &[Arc<ProviderAccount>],
        message: &OutboundMessage,
        to: &str,
        pass: u32,
        state: &mut Attempts,
    ) -> Pass {
        for (account, numbers) in candidate_order(accounts, message) {
            for from in numbers {
                state.count += 1;
                debug!(
                    account_id = account.id(),
                    from = %from,
                    to = %to,
                    attempt = state.count,
                    pass,
                    "sending message"
                );

                let fault = match self.attempt(&account, &from, to, &message.body).await {
                    Ok(message_id) => {
                        info!(
                            account_id = account.id(),
                            from = %from,
                            to = %to,
                            message_id = %message_id,
                            attempt = state.count,
                            pass,
                            "message delivered"
                        );
                        return Pass::Delivered(Delivery {
                            identity: SendIdentity {
                                account: account.clone(),
                                from,
                            },
                            message_id,
                            attempts: state.count,
                            reinitialized: state.reinitialized,
                        });
                    }
                    Err(fault) => fault,
                };

                warn!(
                    account_id = account.id(),
                    from = %from,
                    to = %to,
                    attempt = state.count,
                    pass,
                    scope = %fault.scope,
                    code = fault.code,
                    error = %fault.message,
                    "send attempt failed"
                );

                let account_id = account.id().to_string();
                match fault.scope {
                    FaultScope::Message => {
                        return Pass::Rejected(DeliveryError::PermanentMessage {
                            account_id,
                            from,
                            fault,
                        });
                    }
                    FaultScope::Number => {
                        state.last_failure = Some(DeliveryError::TransientProvider {
                            account_id,
                            from,
                            fault,
                        });
                    }
                    FaultScope::Account => {
                        state.last_failure = Some(DeliveryError::TransientProvider {
                            account_id,
                            from,
                            fault,
                        });
                        break;
                    }
                }
            }
        }
        Pass::Exhausted
    }

    async fn attempt(
        &self,
        account: &ProviderAccount,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<String, ProviderFault> {
        match tokio::time::timeout(
            self.attempt_timeout,
            self.transport.transmit(account, from, to, body),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderFault::timed_out(self.attempt_timeout)),
        }
    }
}

/// Candidate accounts with their numbers, in attempt order.
///
/// The preferred account (by id, else the owner of the preferred number)
/// comes first, with the preferred number ahead of its other numbers. The
/// remaining accounts follow in pool order.
fn candidate_order(
    accounts: &[Arc<ProviderAccount>],
    message: &OutboundMessage,
) -> Vec<(Arc<ProviderAccount>, Vec<String>)> {
    let preferred_from = message
        .preferred_from
        .as_deref()
        .and_then(|f| address::channel_address(f).ok());

    let preferred = message
        .preferred_account_id
        .as_deref()
        .and_then(|id| accounts.iter().position(|a| a.id() == id))
        .or_else(|| {
            let from = preferred_from.as_deref()?;
            accounts.iter().position(|a| a.owns(from))
        });

    let mut order = Vec::with_capacity(accounts.len());
    if let Some(index) = preferred {
        let account = &accounts[index];
        let mut numbers = account.numbers().to_vec();
        if let Some(from) = &preferred_from
            && let Some(pos) = numbers.iter().position(|n| n == from)
        {
            let chosen = numbers.remove(pos);
            numbers.insert(0, chosen);
        }
        order.push((account.clone(), numbers));
    }
    for (index, account) in accounts.iter().enumerate() {
        if Some(index) != preferred {
            order.push((account.clone(), account.numbers().to_vec()));
        }
    }
    order
}
