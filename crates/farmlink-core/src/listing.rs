// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parser for farmer listing messages such as `Tomato 30 kg`.
//!
//! Accepted shapes, checked in order:
//! 1. `<name...> <number> <unit>` (also `<name...> <unit> <number>`)
//! 2. `<name...> <number><unit>`
//! 3. `<name...> <token>` where the last token contains a digit

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("static regex"));

static UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:kg|kgs|ton|tons|quintal|quintals)$").expect("static regex")
});

static NUMBER_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+(?:\.\d+)?(?:kg|kgs|ton|tons|quintal|quintals)$").expect("static regex")
});

/// A product name and quantity extracted from a farmer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedListing {
    pub product_name: String,
    pub quantity: String,
}

/// Why a message could not be read as a listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingParseError {
    /// Fewer than two words.
    #[error("expected `[Product Name] [Quantity]`")]
    InvalidFormat,
    /// Enough words, but no product name or no recognizable quantity.
    #[error("could not find a product name and quantity")]
    Unparseable,
}

/// Split a farmer message into product name and quantity.
pub fn parse_listing(text: &str) -> Result<ParsedListing, ListingParseError> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return Err(ListingParseError::InvalidFormat);
    }

    let last = words[words.len() - 1];
    let second_last = words[words.len() - 2];

    let split_unit = words.len() >= 3;
    let (name_words, quantity) = if split_unit
        && NUMBER.is_match(second_last)
        && UNIT.is_match(last)
    {
        (&words[..words.len() - 2], format!("{second_last} {last}"))
    } else if split_unit && UNIT.is_match(second_last) && NUMBER.is_match(last) {
        (&words[..words.len() - 2], format!("{last} {second_last}"))
    } else if NUMBER_WITH_UNIT.is_match(last) || last.chars().any(|c| c.is_ascii_digit()) {
        (&words[..words.len() - 1], last.to_string())
    } else {
        return Err(ListingParseError::Unparseable);
    };

    let product_name = name_words.join(" ");
    if product_name.is_empty() {
        return Err(ListingParseError::Unparseable);
    }

    Ok(ParsedListing {
        product_name,
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> (String, String) {
        let p = parse_listing(text).expect("should parse");
        (p.product_name, p.quantity)
    }

    #[test]
    fn number_then_unit() {
        assert_eq!(parsed("Tomato 30 kg"), ("Tomato".into(), "30 kg".into()));
        assert_eq!(
            parsed("Green Chilli 2 quintals"),
            ("Green Chilli".into(), "2 quintals".into())
        );
    }

    #[test]
    fn unit_then_number_is_normalized() {
        assert_eq!(parsed("Tomato kg 30"), ("Tomato".into(), "30 kg".into()));
    }

    #[test]
    fn attached_unit() {
        assert_eq!(parsed("Onion 50kg"), ("Onion".into(), "50kg".into()));
        assert_eq!(parsed("Potato 1.5TONS"), ("Potato".into(), "1.5TONS".into()));
    }

    #[test]
    fn bare_number_quantity() {
        assert_eq!(parsed("Banana 120"), ("Banana".into(), "120".into()));
        assert_eq!(parsed("Mango 20dozen"), ("Mango".into(), "20dozen".into()));
    }

    #[test]
    fn extra_whitespace_is_ignored() {
        assert_eq!(parsed("  Tomato   30   kg "), ("Tomato".into(), "30 kg".into()));
    }

    #[test]
    fn single_word_is_invalid_format() {
        assert_eq!(parse_listing("Tomato"), Err(ListingParseError::InvalidFormat));
        assert_eq!(parse_listing(""), Err(ListingParseError::InvalidFormat));
    }

    #[test]
    fn quantity_without_digits_is_rejected() {
        assert_eq!(
            parse_listing("Fresh Tomato"),
            Err(ListingParseError::Unparseable)
        );
    }

    #[test]
    fn quantity_without_name_is_rejected() {
        assert_eq!(parse_listing("30 kg"), Err(ListingParseError::Unparseable));
    }
}
