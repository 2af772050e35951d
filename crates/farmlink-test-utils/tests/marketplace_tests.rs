// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the marketplace routes and order notifications.

use axum::http::StatusCode;
use farmlink_core::{FarmerAffinity, FarmerStore, Listing, ListingStore};
use farmlink_test_utils::TestHarness;
use farmlink_whatsapp::{FaultScope, ProviderFault};
use serde_json::json;

const FARMER: &str = "+919876543210";

async fn harness() -> TestHarness {
    TestHarness::builder()
        .with_account("AC1", "token-1", &["+14155238886"])
        .with_account("AC2", "token-2", &["+15550001111", "+15550002222"])
        .build()
        .await
        .unwrap()
}

async fn seed_listing(h: &TestHarness, product: &str) -> Listing {
    let farmer = match h.store.find_farmer_by_phone(FARMER).await.unwrap() {
        Some(farmer) => farmer,
        None => h.seed_farmer("Ravi", FARMER, true).await,
    };
    let listing = Listing::for_farmer(&farmer, product, "30 kg", "", false);
    h.store.insert_listing(&listing).await.unwrap();
    listing
}

#[tokio::test]
async fn feed_lists_available_products() {
    let h = harness().await;
    seed_listing(&h, "Tomato").await;
    seed_listing(&h, "Onion").await;

    let res = h.get("/api/products").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["products"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_product_is_404() {
    let h = harness().await;
    let res = h.get("/api/products/does-not-exist").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["message"], "Product not found");
}

#[tokio::test]
async fn order_marks_listing_and_alerts_farmer_via_affinity() {
    let h = harness().await;
    let listing = seed_listing(&h, "Tomato").await;
    h.store
        .record_affinity(
            FARMER,
            &FarmerAffinity {
                last_inbound_address: Some("whatsapp:+15550002222".into()),
                last_provider_account_id: Some("AC2".into()),
            },
        )
        .await
        .unwrap();

    let res = h
        .post_json(
            &format!("/api/products/order/{}", listing.id),
            json!({"buyer_name": "Asha", "buyer_phone": "+918888888888"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["message"], "Order placed successfully!");
    assert_eq!(body["notification"], "sent");
    assert_eq!(body["product"]["status"], "ordered");
    assert_eq!(body["product"]["buyer_name"], "Asha");

    let calls = h.transport.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].account_id, "AC2");
    assert_eq!(calls[0].from, "whatsapp:+15550002222");
    assert!(calls[0].body.contains("Order Alert"));
    assert!(calls[0].body.contains("+918888888888"));
}

#[tokio::test]
async fn second_order_is_rejected() {
    let h = harness().await;
    let listing = seed_listing(&h, "Tomato").await;
    let path = format!("/api/products/order/{}", listing.id);

    let first = h.post_json(&path, json!({})).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json()["product"]["buyer_name"], "Anonymous Buyer");

    let second = h.post_json(&path, json!({})).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.json()["message"], "Product is no longer available");
}

#[tokio::test]
async fn order_survives_notification_failure() {
    let h = harness().await;
    let listing = seed_listing(&h, "Tomato").await;
    h.transport
        .fail_account("AC1", ProviderFault::account("suspended"))
        .await;
    h.transport
        .fail_account("AC2", ProviderFault::account("suspended"))
        .await;

    let res = h
        .post_json(&format!("/api/products/order/{}", listing.id), json!({}))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["notification"], "failed");

    let stored = h.store.get_listing(&listing.id).await.unwrap().unwrap();
    assert_eq!(stored.status.to_string(), "ordered");
}

#[tokio::test]
async fn order_with_empty_pool_still_succeeds() {
    let h = TestHarness::builder().build().await.unwrap();
    let listing = seed_listing(&h, "Garlic").await;

    let res = h
        .post_json(&format!("/api/products/order/{}", listing.id), json!({}))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["notification"], "failed");
    assert!(h.transport.calls().await.is_empty());

    let stored = h.store.get_listing(&listing.id).await.unwrap().unwrap();
    assert_eq!(stored.status.to_string(), "ordered");
}

#[tokio::test]
async fn order_alert_fails_over_to_next_account() {
    let h = harness().await;
    let listing = seed_listing(&h, "Onion").await;
    h.transport
        .fail_account(
            "AC1",
            ProviderFault::new(FaultScope::Account, Some(20003), "Authenticate"),
        )
        .await;

    let res = h
        .post_json(&format!("/api/products/order/{}", listing.id), json!({}))
        .await;
    assert_eq!(res.json()["notification"], "sent");

    let delivered = h.transport.delivered().await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].account_id, "AC2");
}

#[tokio::test]
async fn farmer_listings_accept_channel_addresses() {
    let h = harness().await;
    seed_listing(&h, "Tomato").await;

    let res = h.get("/api/products/farmer/whatsapp:+919876543210").await;
    assert_eq!(res.json()["count"], 1);
    let res = h.get("/api/products/farmer/+910000000000").await;
    assert_eq!(res.json()["count"], 0);
}

#[tokio::test]
async fn manual_create_validates_and_requires_known_farmer() {
    let h = harness().await;

    let missing = h
        .post_json("/api/products/create", json!({"farmer_phone": FARMER}))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.json()["message"],
        "Farmer phone, product name, and quantity are required"
    );

    let unknown = h
        .post_json(
            "/api/products/create",
            json!({"farmer_phone": FARMER, "product_name": "Tomato", "quantity": "10 kg"}),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    h.seed_farmer("Ravi", FARMER, true).await;
    let created = h
        .post_json(
            "/api/products/create",
            json!({"farmer_phone": FARMER, "product_name": "Tomato", "quantity": "10 kg"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let body = created.json();
    assert_eq!(body["product"]["farmer_name"], "Ravi");
    assert_eq!(body["product"]["quality_grade"], "Grade B");
    assert_eq!(body["product"]["grading_status"], "default");
}

#[tokio::test]
async fn manual_create_with_image_is_graded() {
    let h = harness().await;
    h.seed_farmer("Ravi", FARMER, true).await;
    h.grader.push_grade("Grade A", 88.0).await;

    let created = h
        .post_json(
            "/api/products/create",
            json!({
                "farmer_phone": FARMER,
                "product_name": "Onion",
                "quantity": "5 quintal",
                "image_url": "/uploads/onion.jpg"
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["product"]["grading_status"], "pending");
    let id = created.json()["product"]["id"].as_str().unwrap().to_string();

    let graded = h.wait_for_grading(&id).await;
    assert_eq!(graded.quality_grade, "Grade A");
    assert_eq!(graded.quality_score, 88.0);
    let requests = h.grader.requests().await;
    assert_eq!(
        requests,
        vec![(
            "https://farmlink.test/uploads/onion.jpg".to_string(),
            "Onion".to_string()
        )]
    );
}
