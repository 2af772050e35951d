// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number and channel address normalization.
//!
//! A canonical phone has no channel prefix and no whitespace
//! (`+919876543210`). A channel address is the canonical phone with the
//! `whatsapp:` prefix the provider expects.

use crate::error::DeliveryError;

/// Scheme marker the provider uses for WhatsApp addresses.
pub const CHANNEL_PREFIX: &str = "whatsapp:";

/// Canonicalize a phone number or channel address.
///
/// Removes all whitespace and any number of leading channel prefixes
/// (case-insensitive). Fails when nothing remains.
pub fn normalize(raw: &str) -> Result<String, DeliveryError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let mut rest = compact.as_str();
    while let Some(stripped) = strip_channel_prefix(rest) {
        rest = stripped;
    }
    if rest.is_empty() {
        return Err(DeliveryError::InvalidAddress(raw.to_string()));
    }
    Ok(rest.to_string())
}

/// Add the channel prefix to `phone` unless it already carries one.
pub fn to_channel_address(phone: &str) -> String {
    if strip_channel_prefix(phone).is_some() {
        phone.to_string()
    } else {
        format!("{CHANNEL_PREFIX}{phone}")
    }
}

/// Normalize `raw` and return it as a channel address.
pub fn channel_address(raw: &str) -> Result<String, DeliveryError> {
    normalize(raw).map(|phone| to_channel_address(&phone))
}

fn strip_channel_prefix(value: &str) -> Option<&str> {
    let head = value.get(..CHANNEL_PREFIX.len())?;
    head.eq_ignore_ascii_case(CHANNEL_PREFIX)
        .then(|| &value[CHANNEL_PREFIX.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_prefix_and_whitespace() {
        assert_eq!(normalize("whatsapp:+91 98765 43210").unwrap(), "+919876543210");
        assert_eq!(normalize("  +14155238886 ").unwrap(), "+14155238886");
        assert_eq!(normalize("WhatsApp:+1415").unwrap(), "+1415");
    }

    #[test]
    fn strips_repeated_prefixes() {
        assert_eq!(normalize("whatsapp:whatsapp:+1415").unwrap(), "+1415");
        assert_eq!(normalize("whatsapp: whats app:+1415").unwrap(), "+1415");
    }

    #[test]
    fn empty_remainder_is_invalid() {
        assert_eq!(
            normalize("whatsapp:  "),
            Err(DeliveryError::InvalidAddress("whatsapp:  ".to_string()))
        );
        assert!(normalize("").is_err());
    }

    #[test]
    fn channel_prefix_is_added_once() {
        let once = to_channel_address("+1415");
        assert_eq!(once, "whatsapp:+1415");
        assert_eq!(to_channel_address(&once), once);
        assert_eq!(channel_address(" whatsapp:+1 415").unwrap(), "whatsapp:+1415");
    }

    #[test]
    fn non_ascii_input_does_not_panic() {
        assert_eq!(normalize("wh€tsapp:1").unwrap(), "wh€tsapp:1");
    }

    proptest! {
        #[test]
        fn normalize_round_trips_through_channel_address(raw in "\\PC{0,24}") {
            if let Ok(phone) = normalize(&raw) {
                let again = normalize(&to_channel_address(&phone)).unwrap();
                prop_assert_eq!(again, phone);
            }
        }

        #[test]
        fn channel_address_is_idempotent(raw in "(whatsapp:)?[+0-9 ]{1,16}") {
            let once = to_channel_address(&raw);
            prop_assert_eq!(to_channel_address(&once), once);
        }
    }
}
