// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider accounts declared through `TWILIO_*` environment variables.
//!
//! `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and `TWILIO_WHATSAPP_NUMBER`
//! describe the first account; the same names with a `_2`, `_3`, ... suffix
//! describe further accounts. `TWILIO_WHATSAPP_NUMBER` may hold a
//! comma-separated list.

use std::collections::BTreeMap;

use crate::model::ProviderAccountConfig;

const PREFIX: &str = "TWILIO_";

#[derive(Debug, Clone, Copy)]
enum Field {
    AccountSid,
    AuthToken,
    Numbers,
}

/// Collect provider accounts from environment-style `(name, value)` pairs.
///
/// Accounts are ordered by suffix (unsuffixed first). Half-configured
/// accounts are returned as-is; the account pool decides what to drop.
pub fn legacy_accounts<I, K, V>(vars: I) -> Vec<ProviderAccountConfig>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut accounts: BTreeMap<u32, ProviderAccountConfig> = BTreeMap::new();

    for (name, value) in vars {
        let Some((field, index)) = parse_name(name.as_ref()) else {
            continue;
        };
        let value = value.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        let account = accounts.entry(index).or_default();
        match field {
            Field::AccountSid => account.account_sid = Some(value.to_string()),
            Field::AuthToken => account.auth_token = Some(value.to_string()),
            Field::Numbers => {
                account.numbers = value
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
    }

    accounts.into_values().collect()
}

/// Split `TWILIO_<FIELD>[_<N>]` into its field and 1-based account index.
fn parse_name(name: &str) -> Option<(Field, u32)> {
    let rest = name.strip_prefix(PREFIX)?;
    let fields = [
        ("ACCOUNT_SID", Field::AccountSid),
        ("AUTH_TOKEN", Field::AuthToken),
        ("WHATSAPP_NUMBER", Field::Numbers),
    ];
    for (label, field) in fields {
        if let Some(suffix) = rest.strip_prefix(label) {
            if suffix.is_empty() {
                return Some((field, 1));
            }
            let index: u32 = suffix.strip_prefix('_')?.parse().ok()?;
            return (index >= 1).then_some((field, index));
        }
    }
    None
}
