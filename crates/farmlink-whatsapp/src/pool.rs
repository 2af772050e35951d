// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider account pool.
//!
//! The pool owns every [`ProviderAccount`]. Accounts are immutable once
//! built; a reload builds a complete replacement list and swaps it in
//! atomically, so concurrent readers see either the old list or the new
//! one, never a partial one.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use farmlink_config::model::ProviderAccountConfig;
use farmlink_core::FarmlinkError;
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::address;

/// A fully configured provider credential pair and the numbers it may
/// send from (as channel addresses, in priority order).
#[derive(Debug)]
pub struct ProviderAccount {
    id: String,
    secret: SecretString,
    numbers: Vec<String>,
}

impl ProviderAccount {
    pub fn new(id: impl Into<String>, secret: SecretString, numbers: Vec<String>) -> Self {
        Self {
            id: id.into(),
            secret,
            numbers,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    pub fn numbers(&self) -> &[String] {
        &self.numbers
    }

    /// Whether `address` (any accepted spelling) is bound to this account.
    pub fn owns(&self, address: &str) -> bool {
        match address::channel_address(address) {
            Ok(wanted) => self.numbers.iter().any(|n| *n == wanted),
            Err(_) => false,
        }
    }
}

/// An (account, sending number) pair usable for one attempt.
#[derive(Debug, Clone)]
pub struct SendIdentity {
    pub account: Arc<ProviderAccount>,
    /// Sending number as a channel address.
    pub from: String,
}

impl SendIdentity {
    pub fn account_id(&self) -> &str {
        self.account.id()
    }
}

impl PartialEq for SendIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.account.id() == other.account.id() && self.from == other.from
    }
}

impl Eq for SendIdentity {}

/// Where the pool reads account declarations from.
pub trait AccountSource: Send + Sync {
    fn load(&self) -> Result<Vec<ProviderAccountConfig>, FarmlinkError>;
}

/// A fixed list of accounts. Reloads always return the same list.
#[derive(Debug, Clone, Default)]
pub struct StaticAccounts(pub Vec<ProviderAccountConfig>);

impl AccountSource for StaticAccounts {
    fn load(&self) -> Result<Vec<ProviderAccountConfig>, FarmlinkError> {
        Ok(self.0.clone())
    }
}

/// Re-reads the layered configuration (files, `FARMLINK_*` and `TWILIO_*`
/// variables) on every load, so rotated credentials are picked up.
#[derive(Debug, Clone, Default)]
pub struct ConfigAccounts {
    path: Option<PathBuf>,
}

impl ConfigAccounts {
    /// Read from the standard configuration hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from an explicit configuration file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl AccountSource for ConfigAccounts {
    fn load(&self) -> Result<Vec<ProviderAccountConfig>, FarmlinkError> {
        let config = match &self.path {
            Some(path) => farmlink_config::load_config_from_path(path),
            None => farmlink_config::load_config(),
        }
        .map_err(|e| FarmlinkError::Config(e.to_string()))?;
        Ok(config.whatsapp.accounts)
    }
}

/// Build pool entries from declarations, in declaration order.
///
/// Skips (with a warning) accounts missing either credential half,
/// accounts without a usable number, and repeated account ids. Invalid
/// numbers are dropped individually.
pub fn build_accounts(configs: &[ProviderAccountConfig]) -> Vec<Arc<ProviderAccount>> {
    let mut accounts: Vec<Arc<ProviderAccount>> = Vec::with_capacity(configs.len());

    for (index, config) in configs.iter().enumerate() {
        let sid = config.account_sid.as_deref().map(str::trim).unwrap_or("");
        let token = config.auth_token.as_deref().map(str::trim).unwrap_or("");
        if sid.is_empty() || token.is_empty() {
            warn!(
                index,
                has_account_sid = !sid.is_empty(),
                has_auth_token = !token.is_empty(),
                "skipping half-configured provider account"
            );
            continue;
        }
        if accounts.iter().any(|a| a.id() == sid) {
            warn!(index, account_id = sid, "skipping duplicate provider account");
            continue;
        }

        let mut numbers: Vec<String> = Vec::with_capacity(config.numbers.len());
        for raw in &config.numbers {
            match address::channel_address(raw) {
                Ok(number) if !numbers.contains(&number) => numbers.push(number),
                Ok(_) => {}
                Err(e) => warn!(account_id = sid, error = %e, "dropping invalid sending number"),
            }
        }
        if numbers.is_empty() {
            warn!(account_id = sid, "skipping provider account without sending numbers");
            continue;
        }

        accounts.push(Arc::new(ProviderAccount::new(
            sid,
            SecretString::from(token.to_string()),
            numbers,
        )));
    }

    accounts
}

/// The shared, atomically replaceable set of provider accounts.
pub struct ProviderPool {
    accounts: ArcSwap<Vec<Arc<ProviderAccount>>>,
    source: Arc<dyn AccountSource>,
    reloads: AtomicU64,
}

impl std::fmt::Debug for ProviderPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderPool")
            .field("accounts", &self.accounts.load_full())
            .field("reloads", &self.reloads.load(Ordering::Relaxed))
            .finish()
    }
}

impl ProviderPool {
    /// Build the pool from `source`. A source that fails to load yields an
    /// empty pool; the dispatcher retries the load before giving up.
    pub fn initialize(source: Arc<dyn AccountSource>) -> Self {
        let accounts = match source.load() {
            Ok(configs) => build_accounts(&configs),
            Err(e) => {
                warn!(error = %e, "could not load provider accounts, starting with an empty pool");
                Vec::new()
            }
        };
        info!(accounts = accounts.len(), "provider account pool initialized");
        Self {
            accounts: ArcSwap::from_pointee(accounts),
            source,
            reloads: AtomicU64::new(0),
        }
    }

    /// Pool over a fixed list of declarations.
    pub fn from_configs(configs: Vec<ProviderAccountConfig>) -> Self {
        Self::initialize(Arc::new(StaticAccounts(configs)))
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.load().is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.load().len()
    }

    /// Consistent view of the accounts in priority order.
    pub fn accounts(&self) -> Arc<Vec<Arc<ProviderAccount>>> {
        self.accounts.load_full()
    }

    pub fn find_account(&self, id: &str) -> Option<Arc<ProviderAccount>> {
        self.accounts.load().iter().find(|a| a.id() == id).cloned()
    }

    /// The first account (in priority order) bound to `address`.
    pub fn owner_of(&self, address: &str) -> Option<Arc<ProviderAccount>> {
        self.accounts.load().iter().find(|a| a.owns(address)).cloned()
    }

    /// Number of successful reloads since construction.
    pub fn reloads(&self) -> u64 {
        self.reloads.load(Ordering::Relaxed)
    }

    /// Reload accounts from the source and swap them in.
    ///
    /// On a load failure the current accounts stay in place and the error is
    /// returned. On success the new list replaces the old one even when it
    /// is empty. Returns the new account count.
    pub fn reinitialize(&self) -> Result<usize, FarmlinkError> {
        let configs = self.source.load().inspect_err(|e| {
            warn!(error = %e, "provider account reload failed, keeping current pool");
        })?;
        let accounts = build_accounts(&configs);
        let count = accounts.len();
        let previous = self.accounts.swap(Arc::new(accounts));
        self.reloads.fetch_add(1, Ordering::Relaxed);
        debug!(previous = previous.len(), current = count, "provider account pool reloaded");
        Ok(count)
    }
}
