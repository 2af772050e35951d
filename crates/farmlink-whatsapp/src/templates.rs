// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message texts sent to farmers.

pub const NOT_REGISTERED: &str =
    "❌ Sorry, you are not registered as a farmer. Please contact admin for registration.";

pub const ACCOUNT_INACTIVE: &str = "❌ Your account is currently inactive. Please contact admin.";

pub const INVALID_FORMAT: &str =
    "❌ Invalid format. Please send: [Product Name] [Quantity]\n\nExample: Tomato 30 kg";

pub const UNPARSEABLE: &str =
    "❌ Could not parse product details. Format: [Product Name] [Quantity]\n\nExample: Tomato 30 kg";

pub const INTERNAL_ERROR: &str =
    "❌ An error occurred. Please try again later or contact support.";

/// Confirmation after a listing has been saved.
pub fn listing_confirmation(product: &str, quantity: &str, grade: &str, location: &str) -> String {
    let location = if location.trim().is_empty() {
        "Not specified"
    } else {
        location
    };
    format!(
        "✅ Product Listed Successfully!\n\n\
         📦 Product: {product}\n\
         ⚖️ Quantity: {quantity}\n\
         ⭐ Quality: {grade}\n\
         📍 Location: {location}\n\n\
         Your produce is now live on the marketplace! 🌾"
    )
}

/// Alert to the farmer that a buyer ordered a listing.
pub fn order_alert(product: &str, quantity: &str, buyer_name: &str, buyer_phone: &str) -> String {
    let buyer_phone = if buyer_phone.trim().is_empty() {
        "Will call you"
    } else {
        buyer_phone
    };
    format!(
        "🎉 *Order Alert!*\n\n\
         A buyer wants to purchase your produce:\n\n\
         📦 Product: {product}\n\
         ⚖️ Quantity: {quantity}\n\
         👤 Buyer: {buyer_name}\n\
         📞 Contact: {buyer_phone}\n\n\
         Please prepare the order for dispatch! 🚜"
    )
}

/// Welcome message sent when an admin approves a farmer.
pub fn welcome(name: &str) -> String {
    format!(
        "🎉 *Congratulations {name}!*\n\n\
         Your FarmLink AI account has been APPROVED! ✅\n\n\
         You can now start listing your vegetables on our marketplace.\n\n\
         *Listing is easy:*\n\
         Just send: [Vegetable] [Quantity]\n\n\
         Examples:\n\
         ✅ Tomato 50kg\n\
         ✅ Onion 100 kg\n\
         ✅ Potato 200kg\n\n\
         📸 You can attach photos for better prices!\n\n\
         Welcome to FarmLink AI! 🧑‍🌾"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_fills_missing_location() {
        let text = listing_confirmation("Tomato", "30 kg", "Grade B", " ");
        assert!(text.contains("📦 Product: Tomato\n"));
        assert!(text.contains("📍 Location: Not specified"));
    }

    #[test]
    fn order_alert_without_buyer_phone() {
        let text = order_alert("Onion", "50kg", "Anonymous Buyer", "");
        assert!(text.contains("👤 Buyer: Anonymous Buyer"));
        assert!(text.contains("📞 Contact: Will call you"));
    }

    #[test]
    fn welcome_addresses_farmer_by_name() {
        assert!(welcome("Ravi").starts_with("🎉 *Congratulations Ravi!*"));
    }
}
