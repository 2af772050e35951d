// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain records shared by the webhook, marketplace, and storage layers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Grade assigned to a listing before (or instead of) AI grading.
pub const DEFAULT_QUALITY_GRADE: &str = "Grade B";

/// Score paired with [`DEFAULT_QUALITY_GRADE`].
pub const DEFAULT_QUALITY_SCORE: f64 = 75.0;

/// Current UTC time in the millisecond ISO 8601 form used by every record.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Fresh record identifier (UUID v4).
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Health status reported by storage health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but experiencing issues.
    Degraded(String),
    /// Not operational.
    Unhealthy(String),
}

/// Admin review state of a farmer registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// A registered farmer.
///
/// `phone` is stored in canonical form (no channel prefix, no whitespace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farmer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub village: String,
    pub district: String,
    pub location: String,
    pub crops: String,
    pub approval_status: ApprovalStatus,
    /// Only active farmers may list produce. Set on approval.
    pub is_active: bool,
    pub approved_by: String,
    pub approved_at: Option<String>,
    pub rejection_reason: String,
    pub welcome_sent: bool,
    pub welcome_sent_at: Option<String>,
    /// Provider number (channel address) the farmer last messaged.
    pub last_whatsapp_from: String,
    /// Provider account that received the farmer's last inbound message.
    pub last_account_sid: String,
    pub created_at: String,
}

impl Farmer {
    /// Build a pending, inactive farmer from self-registration details.
    pub fn register(
        name: impl Into<String>,
        phone: impl Into<String>,
        village: impl Into<String>,
        district: impl Into<String>,
        crops: impl Into<String>,
    ) -> Self {
        let village = village.into();
        let district = district.into();
        Self {
            id: new_record_id(),
            name: name.into(),
            phone: phone.into(),
            location: format!("{village}, {district}"),
            village,
            district,
            crops: crops.into(),
            approval_status: ApprovalStatus::Pending,
            is_active: false,
            approved_by: String::new(),
            approved_at: None,
            rejection_reason: String::new(),
            welcome_sent: false,
            welcome_sent_at: None,
            last_whatsapp_from: String::new(),
            last_account_sid: String::new(),
            created_at: now_timestamp(),
        }
    }

    /// The sending identity this farmer last interacted with.
    pub fn affinity(&self) -> FarmerAffinity {
        FarmerAffinity {
            last_inbound_address: non_empty(&self.last_whatsapp_from),
            last_provider_account_id: non_empty(&self.last_account_sid),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The most recent inbound contact of a farmer. No history is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerAffinity {
    /// Provider number the farmer wrote to.
    pub last_inbound_address: Option<String>,
    /// Provider account that received the message.
    pub last_provider_account_id: Option<String>,
}

impl FarmerAffinity {
    pub fn is_empty(&self) -> bool {
        self.last_inbound_address.is_none() && self.last_provider_account_id.is_none()
    }
}

/// Marketplace state of a listing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Ordered,
}

/// Progress of the asynchronous quality grading for a listing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GradingStatus {
    /// A grading job is in flight.
    Pending,
    /// The grade came from the grading service.
    Graded,
    /// No grade was produced; the default grade stands.
    Default,
}

/// A produce listing on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub farmer_phone: String,
    pub farmer_name: String,
    pub farmer_location: String,
    pub product_name: String,
    pub quantity: String,
    pub image_url: String,
    pub status: ListingStatus,
    pub quality_grade: String,
    pub quality_score: f64,
    pub grading_status: GradingStatus,
    pub buyer_name: Option<String>,
    pub buyer_phone: Option<String>,
    pub ordered_at: Option<String>,
    pub created_at: String,
}

impl Listing {
    /// Create an available listing for `farmer` carrying the default grade.
    ///
    /// `grading_status` starts as `Pending` when a grading job will follow.
    pub fn for_farmer(
        farmer: &Farmer,
        product_name: impl Into<String>,
        quantity: impl Into<String>,
        image_url: impl Into<String>,
        grading_pending: bool,
    ) -> Self {
        Self {
            id: new_record_id(),
            farmer_phone: farmer.phone.clone(),
            farmer_name: farmer.name.clone(),
            farmer_location: farmer.location.clone(),
            product_name: product_name.into(),
            quantity: quantity.into(),
            image_url: image_url.into(),
            status: ListingStatus::Available,
            quality_grade: DEFAULT_QUALITY_GRADE.to_string(),
            quality_score: DEFAULT_QUALITY_SCORE,
            grading_status: if grading_pending {
                GradingStatus::Pending
            } else {
                GradingStatus::Default
            },
            buyer_name: None,
            buyer_phone: None,
            ordered_at: None,
            created_at: now_timestamp(),
        }
    }
}

/// A quality grade returned by the grading service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    pub grade: String,
    #[serde(default)]
    pub score: f64,
}

/// Buyer details recorded when a listing is ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub buyer_name: String,
    pub buyer_phone: String,
    pub ordered_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn registration_starts_pending_and_inactive() {
        let farmer = Farmer::register("Ravi", "+919876543210", "Hosur", "Krishnagiri", "");
        assert_eq!(farmer.approval_status, ApprovalStatus::Pending);
        assert!(!farmer.is_active);
        assert_eq!(farmer.location, "Hosur, Krishnagiri");
        assert!(farmer.affinity().is_empty());
    }

    #[test]
    fn affinity_ignores_blank_fields() {
        let mut farmer = Farmer::register("Ravi", "+919876543210", "Hosur", "Krishnagiri", "");
        farmer.last_whatsapp_from = "  ".to_string();
        farmer.last_account_sid = "AC123".to_string();
        let affinity = farmer.affinity();
        assert!(affinity.last_inbound_address.is_none());
        assert_eq!(affinity.last_provider_account_id.as_deref(), Some("AC123"));
    }

    #[test]
    fn status_enums_round_trip_through_strings() {
        assert_eq!(ApprovalStatus::Approved.to_string(), "approved");
        assert_eq!(
            ApprovalStatus::from_str("rejected").unwrap(),
            ApprovalStatus::Rejected
        );
        assert_eq!(ListingStatus::Ordered.to_string(), "ordered");
        assert_eq!(
            GradingStatus::from_str("default").unwrap(),
            GradingStatus::Default
        );
    }

    #[test]
    fn listing_defaults_follow_grading_intent() {
        let farmer = Farmer::register("Ravi", "+919876543210", "Hosur", "Krishnagiri", "");
        let with_photo = Listing::for_farmer(&farmer, "Tomato", "30 kg", "", true);
        assert_eq!(with_photo.grading_status, GradingStatus::Pending);
        assert_eq!(with_photo.quality_grade, DEFAULT_QUALITY_GRADE);

        let without_photo = Listing::for_farmer(&farmer, "Onion", "50kg", "", false);
        assert_eq!(without_photo.grading_status, GradingStatus::Default);
        assert_eq!(without_photo.status, ListingStatus::Available);
        assert_eq!(without_photo.farmer_location, "Hosur, Krishnagiri");
    }
}
