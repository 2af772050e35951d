// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging transport for deterministic delivery tests.
//!
//! Responses are scripted per sending identity (account id + number).
//! Identities without a script succeed with a generated message id.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use farmlink_whatsapp::{MessagingTransport, ProviderAccount, ProviderFault};

/// One call made through the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub account_id: String,
    pub from: String,
    pub to: String,
    pub body: String,
    /// Whether the call succeeded.
    pub delivered: bool,
}

type Identity = (String, String);

#[derive(Default)]
struct Script {
    queued: HashMap<Identity, VecDeque<Result<(), ProviderFault>>>,
    failing_accounts: HashMap<String, ProviderFault>,
    calls: Vec<SentMessage>,
}

/// A [`MessagingTransport`] that never touches the network.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for sends through `account_id` from `from`.
    ///
    /// `from` is the channel address (`whatsapp:+1...`). Once the queue is
    /// drained the identity succeeds again.
    pub async fn script(
        &self,
        account_id: &str,
        from: &str,
        outcomes: Vec<Result<(), ProviderFault>>,
    ) {
        self.script
            .lock()
            .await
            .queued
            .entry((account_id.to_string(), from.to_string()))
            .or_default()
            .extend(outcomes);
    }

    /// Make every send through `account_id` fail with `fault`.
    pub async fn fail_account(&self, account_id: &str, fault: ProviderFault) {
        self.script
            .lock()
            .await
            .failing_accounts
            .insert(account_id.to_string(), fault);
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<SentMessage> {
        self.script.lock().await.calls.clone()
    }

    /// Calls that succeeded, in order.
    pub async fn delivered(&self) -> Vec<SentMessage> {
        self.calls()
            .await
            .into_iter()
            .filter(|c| c.delivered)
            .collect()
    }
}

#[async_trait]
impl MessagingTransport for MockTransport {
    async fn transmit(
        &self,
        account: &ProviderAccount,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<String, ProviderFault> {
        let mut script = self.script.lock().await;
        let outcome = match script.failing_accounts.get(account.id()) {
            Some(fault) => Err(fault.clone()),
            None => script
                .queued
                .get_mut(&(account.id().to_string(), from.to_string()))
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(())),
        };

        script.calls.push(SentMessage {
            account_id: account.id().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            body: body.to_string(),
            delivered: outcome.is_ok(),
        });
        let n = script.calls.len();
        outcome.map(|()| format!("SM-mock-{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmlink_whatsapp::FaultScope;

    fn account(id: &str) -> ProviderAccount {
        ProviderAccount::new(id, "token".to_string().into(), vec!["whatsapp:+1".into()])
    }

    #[tokio::test]
    async fn scripted_outcomes_drain_then_succeed() {
        let transport = MockTransport::new();
        transport
            .script(
                "AC1",
                "whatsapp:+1",
                vec![Err(ProviderFault::new(FaultScope::Number, Some(63007), "x"))],
            )
            .await;

        let acc = account("AC1");
        assert!(transport.transmit(&acc, "whatsapp:+1", "whatsapp:+9", "a").await.is_err());
        let sid = transport.transmit(&acc, "whatsapp:+1", "whatsapp:+9", "b").await.unwrap();
        assert_eq!(sid, "SM-mock-2");
        assert_eq!(transport.delivered().await.len(), 1);
    }

    #[tokio::test]
    async fn failing_account_always_fails() {
        let transport = MockTransport::new();
        transport
            .fail_account("AC1", ProviderFault::account("suspended"))
            .await;
        let acc = account("AC1");
        for _ in 0..3 {
            assert!(transport.transmit(&acc, "whatsapp:+1", "whatsapp:+9", "x").await.is_err());
        }
        assert_eq!(transport.calls().await.len(), 3);
    }
}
