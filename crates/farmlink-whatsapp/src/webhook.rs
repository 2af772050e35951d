// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook payloads, TwiML replies and request signatures.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

/// Header carrying the provider's request signature.
pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// The fields of an inbound message webhook the service uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender channel address (`whatsapp:+91...`).
    pub from: String,
    /// Provider number the message was sent to.
    pub to: String,
    /// Message text, trimmed.
    pub body: String,
    pub num_media: u32,
    /// First attachment URL, when any.
    pub media_url: Option<String>,
    /// Provider account that received the message.
    pub account_sid: Option<String>,
    pub message_sid: Option<String>,
}

impl InboundMessage {
    /// Read the webhook's form parameters. Missing fields become empty.
    pub fn from_params(params: &BTreeMap<String, String>) -> Self {
        let text = |key: &str| params.get(key).map(|v| v.trim().to_string());
        let non_empty = |key: &str| text(key).filter(|v| !v.is_empty());

        Self {
            from: text("From").unwrap_or_default(),
            to: text("To").unwrap_or_default(),
            body: text("Body").unwrap_or_default(),
            num_media: text("NumMedia")
                .and_then(|n| n.parse().ok())
                .unwrap_or(0),
            media_url: non_empty("MediaUrl0"),
            account_sid: non_empty("AccountSid"),
            message_sid: non_empty("MessageSid"),
        }
    }

    /// URL of the first attachment, if the message carries media.
    pub fn first_media(&self) -> Option<&str> {
        if self.num_media > 0 {
            self.media_url.as_deref()
        } else {
            None
        }
    }
}

/// A TwiML document replying with one message.
pub fn twiml_message(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(text)
    )
}

/// A TwiML document that sends nothing.
pub fn twiml_empty() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>".to_string()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compute the signature the provider sends for a form POST to `url`.
///
/// The signed text is the full request URL followed by every parameter
/// name and value, ordered by name.
pub fn compute_signature(auth_token: &str, url: &str, params: &BTreeMap<String, String>) -> String {
    STANDARD.encode(signature_mac(auth_token, url, params).finalize().into_bytes())
}

/// Check `signature` in constant time.
pub fn validate_signature(
    auth_token: &str,
    url: &str,
    params: &BTreeMap<String, String>,
    signature: &str,
) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    signature_mac(auth_token, url, params)
        .verify_slice(&expected)
        .is_ok()
}

fn signature_mac(auth_token: &str, url: &str, params: &BTreeMap<String, String>) -> Hmac<Sha1> {
    let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(auth_token.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(url.as_bytes());
    for (key, value) in params {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    mac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_inbound_fields() {
        let msg = InboundMessage::from_params(&params(&[
            ("From", "whatsapp:+919876543210"),
            ("To", "whatsapp:+14155238886"),
            ("Body", "  Tomato 30 kg "),
            ("NumMedia", "1"),
            ("MediaUrl0", "https://api.twilio.com/Media/ME1"),
            ("AccountSid", "AC1"),
        ]));
        assert_eq!(msg.body, "Tomato 30 kg");
        assert_eq!(msg.first_media(), Some("https://api.twilio.com/Media/ME1"));
        assert_eq!(msg.account_sid.as_deref(), Some("AC1"));
        assert!(msg.message_sid.is_none());
    }

    #[test]
    fn media_count_gates_media_url() {
        let msg = InboundMessage::from_params(&params(&[
            ("NumMedia", "zero"),
            ("MediaUrl0", "https://x/m"),
        ]));
        assert_eq!(msg.num_media, 0);
        assert_eq!(msg.first_media(), None);
    }

    #[test]
    fn twiml_escapes_markup() {
        let xml = twiml_message("a < b & \"c\"");
        assert!(xml.contains("<Message>a &lt; b &amp; &quot;c&quot;</Message>"));
        assert!(twiml_empty().ends_with("<Response></Response>"));
    }

    // Example from Twilio's webhook security documentation.
    #[test]
    fn signature_matches_reference_example() {
        let token = "12345";
        let url = "https://mycompany.com/myapp.php?foo=1&bar=2";
        let form = params(&[
            ("CallSid", "CA1234567890ABCDE"),
            ("Caller", "+12349013030"),
            ("Digits", "1234"),
            ("From", "+12349013030"),
            ("To", "+18005551212"),
        ]);
        let signature = compute_signature(token, url, &form);
        assert_eq!(signature, "0/KCTR6DLpKmkAf8muzZqo1nDgQ=");
        assert!(validate_signature(token, url, &form, &signature));
    }

    #[test]
    fn tampered_requests_fail_validation() {
        let form = params(&[("Body", "Tomato 30 kg")]);
        let signature = compute_signature("token", "https://a/api/whatsapp", &form);

        let tampered = params(&[("Body", "Tomato 300 kg")]);
        assert!(!validate_signature("token", "https://a/api/whatsapp", &tampered, &signature));
        assert!(!validate_signature("other", "https://a/api/whatsapp", &form, &signature));
        assert!(!validate_signature("token", "https://a/api/whatsapp", &form, "not base64!"));
    }
}
