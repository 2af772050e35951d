// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing CRUD operations.

use farmlink_core::{
    DEFAULT_QUALITY_GRADE, DEFAULT_QUALITY_SCORE, FarmlinkError, GradeResult, GradingStatus,
    Listing, ListingStatus, OrderDetails,
};
use rusqlite::{Row, params};

use crate::database::{Database, map_tr_err};
use crate::queries::parse_column;

const COLUMNS: &str = "id, farmer_phone, farmer_name, farmer_location, product_name, quantity,
     image_url, status, quality_grade, quality_score, grading_status, buyer_name, buyer_phone,
     ordered_at, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
    Ok(Listing {
        id: row.get(0)?,
        farmer_phone: row.get(1)?,
        farmer_name: row.get(2)?,
        farmer_location: row.get(3)?,
        product_name: row.get(4)?,
        quantity: row.get(5)?,
        image_url: row.get(6)?,
        status: parse_column(row, 7)?,
        quality_grade: row.get(8)?,
        quality_score: row.get(9)?,
        grading_status: parse_column(row, 10)?,
        buyer_name: row.get(11)?,
        buyer_phone: row.get(12)?,
        ordered_at: row.get(13)?,
        created_at: row.get(14)?,
    })
}

fn select_one(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Listing>> {
    let sql = format!("SELECT {COLUMNS} FROM listings WHERE id = ?1");
    match conn.query_row(&sql, params![id], from_row) {
        Ok(listing) => Ok(Some(listing)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Insert a new listing.
pub async fn insert_listing(db: &Database, listing: &Listing) -> Result<(), FarmlinkError> {
    let listing = listing.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO listings (id, farmer_phone, farmer_name, farmer_location,
                     product_name, quantity, image_url, status, quality_grade, quality_score,
                     grading_status, buyer_name, buyer_phone, ordered_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    listing.id,
                    listing.farmer_phone,
                    listing.farmer_name,
                    listing.farmer_location,
                    listing.product_name,
                    listing.quantity,
                    listing.image_url,
                    listing.status.to_string(),
                    listing.quality_grade,
                    listing.quality_score,
                    listing.grading_status.to_string(),
                    listing.buyer_name,
                    listing.buyer_phone,
                    listing.ordered_at,
                    listing.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a listing by ID.
pub async fn get_listing(db: &Database, id: &str) -> Result<Option<Listing>, FarmlinkError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_one(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Available listings, newest first, at most `limit` rows.
pub async fn list_available(db: &Database, limit: i64) -> Result<Vec<Listing>, FarmlinkError> {
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {COLUMNS} FROM listings WHERE status = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![ListingStatus::Available.to_string(), limit],
                from_row,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Every listing of the farmer with `phone`, newest first.
pub async fn list_by_farmer(db: &Database, phone: &str) -> Result<Vec<Listing>, FarmlinkError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {COLUMNS} FROM listings WHERE farmer_phone = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![phone], from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Move an available listing to `ordered` and return the updated row.
///
/// The status check and the update are one statement, so two concurrent
/// orders for the same listing cannot both succeed.
pub async fn mark_ordered(
    db: &Database,
    id: &str,
    order: &OrderDetails,
) -> Result<Option<Listing>, FarmlinkError> {
    let id = id.to_string();
    let order = order.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE listings SET status = ?2, buyer_name = ?3, buyer_phone = ?4, ordered_at = ?5
                 WHERE id = ?1 AND status = ?6",
                params![
                    id,
                    ListingStatus::Ordered.to_string(),
                    order.buyer_name,
                    order.buyer_phone,
                    order.ordered_at,
                    ListingStatus::Available.to_string(),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_one(conn, &id)
        })
        .await
        .map_err(map_tr_err)
}

/// Point the listing at a stored product image.
pub async fn set_image_url(db: &Database, id: &str, image_url: &str) -> Result<(), FarmlinkError> {
    let id = id.to_string();
    let image_url = image_url.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE listings SET image_url = ?2 WHERE id = ?1",
                params![id, image_url],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Store a grade from the grading service.
pub async fn record_grade(
    db: &Database,
    id: &str,
    grade: &GradeResult,
) -> Result<(), FarmlinkError> {
    let id = id.to_string();
    let grade = grade.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE listings SET quality_grade = ?2, quality_score = ?3, grading_status = ?4
                 WHERE id = ?1",
                params![
                    id,
                    grade.grade,
                    grade.score,
                    GradingStatus::Graded.to_string()
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Settle a pending grading job on the default grade.
///
/// Listings that are no longer pending keep whatever grade they hold.
pub async fn settle_default_grade(db: &Database, id: &str) -> Result<(), FarmlinkError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE listings SET quality_grade = ?2, quality_score = ?3, grading_status = ?4
                 WHERE id = ?1 AND grading_status = ?5",
                params![
                    id,
                    DEFAULT_QUALITY_GRADE,
                    DEFAULT_QUALITY_SCORE,
                    GradingStatus::Default.to_string(),
                    GradingStatus::Pending.to_string(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmlink_core::Farmer;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn listing(product: &str, pending: bool) -> Listing {
        let farmer = Farmer::register("Ravi", "+919876543210", "Hosur", "Krishnagiri", "");
        Listing::for_farmer(&farmer, product, "30 kg", "", pending)
    }

    fn order() -> OrderDetails {
        OrderDetails {
            buyer_name: "Asha".into(),
            buyer_phone: "+918888888888".into(),
            ordered_at: "2026-03-01T10:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let db = setup().await;
        let l = listing("Tomato", true);
        insert_listing(&db, &l).await.unwrap();
        assert_eq!(get_listing(&db, &l.id).await.unwrap(), Some(l));
        assert!(get_listing(&db, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn available_listings_are_newest_first_and_limited() {
        let db = setup().await;
        for (i, name) in ["Tomato", "Onion", "Potato"].iter().enumerate() {
            let mut l = listing(name, false);
            l.created_at = format!("2026-03-0{}T00:00:00.000Z", i + 1);
            insert_listing(&db, &l).await.unwrap();
        }

        let all = list_available(&db, 50).await.unwrap();
        let names: Vec<_> = all.iter().map(|l| l.product_name.as_str()).collect();
        assert_eq!(names, ["Potato", "Onion", "Tomato"]);
        assert_eq!(list_available(&db, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn order_succeeds_once() {
        let db = setup().await;
        let l = listing("Tomato", false);
        insert_listing(&db, &l).await.unwrap();

        let ordered = mark_ordered(&db, &l.id, &order()).await.unwrap().unwrap();
        assert_eq!(ordered.status, ListingStatus::Ordered);
        assert_eq!(ordered.buyer_name.as_deref(), Some("Asha"));

        assert!(mark_ordered(&db, &l.id, &order()).await.unwrap().is_none());
        assert!(mark_ordered(&db, "missing", &order()).await.unwrap().is_none());
        assert!(list_available(&db, 50).await.unwrap().is_empty());
        assert_eq!(list_by_farmer(&db, "+919876543210").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn grade_then_default_does_not_overwrite() {
        let db = setup().await;
        let l = listing("Tomato", true);
        insert_listing(&db, &l).await.unwrap();

        let grade = GradeResult {
            grade: "Grade A".into(),
            score: 91.5,
        };
        record_grade(&db, &l.id, &grade).await.unwrap();
        settle_default_grade(&db, &l.id).await.unwrap();

        let stored = get_listing(&db, &l.id).await.unwrap().unwrap();
        assert_eq!(stored.quality_grade, "Grade A");
        assert_eq!(stored.quality_score, 91.5);
        assert_eq!(stored.grading_status, GradingStatus::Graded);
    }

    #[tokio::test]
    async fn pending_listing_settles_on_default() {
        let db = setup().await;
        let l = listing("Onion", true);
        insert_listing(&db, &l).await.unwrap();
        set_image_url(&db, &l.id, "/uploads/product-1.jpg").await.unwrap();
        settle_default_grade(&db, &l.id).await.unwrap();

        let stored = get_listing(&db, &l.id).await.unwrap().unwrap();
        assert_eq!(stored.grading_status, GradingStatus::Default);
        assert_eq!(stored.quality_grade, DEFAULT_QUALITY_GRADE);
        assert_eq!(stored.image_url, "/uploads/product-1.jpg");
    }
}
