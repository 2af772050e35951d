// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Farmer CRUD operations.

use farmlink_core::{ApprovalStatus, Farmer, FarmerAffinity, FarmlinkError};
use rusqlite::{ErrorCode, Row, params};

use crate::database::{Database, map_tr_err};
use crate::queries::parse_column;

const COLUMNS: &str = "id, name, phone, village, district, location, crops, approval_status,
     is_active, approved_by, approved_at, rejection_reason, welcome_sent, welcome_sent_at,
     last_whatsapp_from, last_account_sid, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Farmer> {
    Ok(Farmer {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        village: row.get(3)?,
        district: row.get(4)?,
        location: row.get(5)?,
        crops: row.get(6)?,
        approval_status: parse_column(row, 7)?,
        is_active: row.get(8)?,
        approved_by: row.get(9)?,
        approved_at: row.get(10)?,
        rejection_reason: row.get(11)?,
        welcome_sent: row.get(12)?,
        welcome_sent_at: row.get(13)?,
        last_whatsapp_from: row.get(14)?,
        last_account_sid: row.get(15)?,
        created_at: row.get(16)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

/// Insert a farmer. Fails with `Conflict` when the phone is already registered.
pub async fn insert_farmer(db: &Database, farmer: &Farmer) -> Result<(), FarmlinkError> {
    let farmer = farmer.clone();
    let phone = farmer.phone.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO farmers (id, name, phone, village, district, location, crops,
                     approval_status, is_active, approved_by, approved_at, rejection_reason,
                     welcome_sent, welcome_sent_at, last_whatsapp_from, last_account_sid, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    farmer.id,
                    farmer.name,
                    farmer.phone,
                    farmer.village,
                    farmer.district,
                    farmer.location,
                    farmer.crops,
                    farmer.approval_status.to_string(),
                    farmer.is_active,
                    farmer.approved_by,
                    farmer.approved_at,
                    farmer.rejection_reason,
                    farmer.welcome_sent,
                    farmer.welcome_sent_at,
                    farmer.last_whatsapp_from,
                    farmer.last_account_sid,
                    farmer.created_at,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(FarmlinkError::Conflict(format!(
            "a farmer with phone {phone} is already registered"
        )))
    }
}

/// Get a farmer by id.
pub async fn get_farmer(db: &Database, id: &str) -> Result<Option<Farmer>, FarmlinkError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {COLUMNS} FROM farmers WHERE id = ?1");
            match conn.query_row(&sql, params![id], from_row) {
                Ok(farmer) => Ok(Some(farmer)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Get a farmer by canonical phone number.
pub async fn find_farmer_by_phone(
    db: &Database,
    phone: &str,
) -> Result<Option<Farmer>, FarmlinkError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {COLUMNS} FROM farmers WHERE phone = ?1");
            match conn.query_row(&sql, params![phone], from_row) {
                Ok(farmer) => Ok(Some(farmer)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List farmers newest first, optionally filtered by approval status.
pub async fn list_farmers(
    db: &Database,
    status: Option<ApprovalStatus>,
) -> Result<Vec<Farmer>, FarmlinkError> {
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut farmers = Vec::new();
            match &status {
                Some(status) => {
                    let sql = format!(
                        "SELECT {COLUMNS} FROM farmers WHERE approval_status = ?1
                         ORDER BY created_at DESC, rowid DESC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    for farmer in stmt.query_map(params![status], from_row)? {
                        farmers.push(farmer?);
                    }
                }
                None => {
                    let sql =
                        format!("SELECT {COLUMNS} FROM farmers ORDER BY created_at DESC, rowid DESC");
                    let mut stmt = conn.prepare(&sql)?;
                    for farmer in stmt.query_map([], from_row)? {
                        farmers.push(farmer?);
                    }
                }
            }
            Ok(farmers)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the mutable columns of a farmer. Affinity is owned by
/// [`record_affinity`] and left untouched.
///
/// Fails with `NotFound` for an unknown id and `Conflict` when the new
/// phone belongs to another farmer.
pub async fn update_farmer(db: &Database, farmer: &Farmer) -> Result<(), FarmlinkError> {
    let farmer = farmer.clone();
    let id = farmer.id.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let result = conn.execute(
                "UPDATE farmers SET name = ?2, phone = ?3, village = ?4, district = ?5,
                     location = ?6, crops = ?7, approval_status = ?8, is_active = ?9,
                     approved_by = ?10, approved_at = ?11, rejection_reason = ?12,
                     welcome_sent = ?13, welcome_sent_at = ?14
                 WHERE id = ?1",
                params![
                    farmer.id,
                    farmer.name,
                    farmer.phone,
                    farmer.village,
                    farmer.district,
                    farmer.location,
                    farmer.crops,
                    farmer.approval_status.to_string(),
                    farmer.is_active,
                    farmer.approved_by,
                    farmer.approved_at,
                    farmer.rejection_reason,
                    farmer.welcome_sent,
                    farmer.welcome_sent_at,
                ],
            );
            match result {
                Ok(rows) => Ok(Some(rows)),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        Some(0) => Err(FarmlinkError::not_found("farmer", id)),
        Some(_) => Ok(()),
        None => Err(FarmlinkError::Conflict(
            "another farmer already uses this phone number".to_string(),
        )),
    }
}

/// Replace the recorded affinity of the farmer with `phone`.
pub async fn record_affinity(
    db: &Database,
    phone: &str,
    affinity: &FarmerAffinity,
) -> Result<(), FarmlinkError> {
    let phone = phone.to_string();
    let from = affinity.last_inbound_address.clone().unwrap_or_default();
    let account = affinity.last_provider_account_id.clone().unwrap_or_default();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE farmers SET last_whatsapp_from = ?2, last_account_sid = ?3 WHERE phone = ?1",
                params![phone, from, account],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record that the welcome message reached the farmer.
pub async fn mark_welcome_sent(db: &Database, id: &str, sent_at: &str) -> Result<(), FarmlinkError> {
    let id = id.to_string();
    let sent_at = sent_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE farmers SET welcome_sent = 1, welcome_sent_at = ?2 WHERE id = ?1",
                params![id, sent_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a farmer. Returns `false` when no row matched.
pub async fn delete_farmer(db: &Database, id: &str) -> Result<bool, FarmlinkError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let rows = conn.execute("DELETE FROM farmers WHERE id = ?1", params![id])?;
            Ok(rows > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn farmer(phone: &str) -> Farmer {
        Farmer::register("Ravi", phone, "Hosur", "Krishnagiri", "tomato")
    }

    #[tokio::test]
    async fn insert_and_fetch_by_id_and_phone() {
        let db = setup().await;
        let f = farmer("+919876543210");
        insert_farmer(&db, &f).await.unwrap();

        assert_eq!(get_farmer(&db, &f.id).await.unwrap(), Some(f.clone()));
        let by_phone = find_farmer_by_phone(&db, "+919876543210").await.unwrap();
        assert_eq!(by_phone.map(|x| x.id), Some(f.id));
        assert!(get_farmer(&db, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_phone_is_a_conflict() {
        let db = setup().await;
        insert_farmer(&db, &farmer("+91111")).await.unwrap();
        let err = insert_farmer(&db, &farmer("+91111")).await.unwrap_err();
        assert!(matches!(err, FarmlinkError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let db = setup().await;
        let pending = farmer("+911");
        let mut approved = farmer("+912");
        approved.approval_status = ApprovalStatus::Approved;
        approved.is_active = true;
        insert_farmer(&db, &pending).await.unwrap();
        insert_farmer(&db, &approved).await.unwrap();

        assert_eq!(list_farmers(&db, None).await.unwrap().len(), 2);
        let only = list_farmers(&db, Some(ApprovalStatus::Approved)).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].phone, "+912");
        assert!(only[0].is_active);
    }

    #[tokio::test]
    async fn update_changes_columns_and_reports_missing() {
        let db = setup().await;
        let mut f = farmer("+911");
        insert_farmer(&db, &f).await.unwrap();

        f.name = "Ravi Kumar".into();
        f.rejection_reason = "duplicate".into();
        f.approval_status = ApprovalStatus::Rejected;
        update_farmer(&db, &f).await.unwrap();
        let stored = get_farmer(&db, &f.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ravi Kumar");
        assert_eq!(stored.approval_status, ApprovalStatus::Rejected);

        let mut ghost = farmer("+919");
        ghost.id = "ghost".into();
        assert!(matches!(
            update_farmer(&db, &ghost).await.unwrap_err(),
            FarmlinkError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn update_to_taken_phone_is_a_conflict() {
        let db = setup().await;
        let a = farmer("+911");
        let mut b = farmer("+912");
        insert_farmer(&db, &a).await.unwrap();
        insert_farmer(&db, &b).await.unwrap();
        b.phone = "+911".into();
        assert!(matches!(
            update_farmer(&db, &b).await.unwrap_err(),
            FarmlinkError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn affinity_keeps_only_latest_contact() {
        let db = setup().await;
        let f = farmer("+911");
        insert_farmer(&db, &f).await.unwrap();

        let first = FarmerAffinity {
            last_inbound_address: Some("whatsapp:+1000".into()),
            last_provider_account_id: Some("AC1".into()),
        };
        record_affinity(&db, "+911", &first).await.unwrap();
        let second = FarmerAffinity {
            last_inbound_address: Some("whatsapp:+2000".into()),
            last_provider_account_id: None,
        };
        record_affinity(&db, "+911", &second).await.unwrap();

        let stored = get_farmer(&db, &f.id).await.unwrap().unwrap();
        assert_eq!(stored.affinity(), second);
    }

    #[tokio::test]
    async fn update_with_stale_copy_keeps_affinity() {
        let db = setup().await;
        let f = farmer("+911");
        insert_farmer(&db, &f).await.unwrap();

        let mut loaded = get_farmer(&db, &f.id).await.unwrap().unwrap();
        let affinity = FarmerAffinity {
            last_inbound_address: Some("whatsapp:+15550001111".into()),
            last_provider_account_id: Some("AC2".into()),
        };
        record_affinity(&db, "+911", &affinity).await.unwrap();

        loaded.village = "Nashik".into();
        update_farmer(&db, &loaded).await.unwrap();

        let stored = get_farmer(&db, &f.id).await.unwrap().unwrap();
        assert_eq!(stored.village, "Nashik");
        assert_eq!(stored.affinity(), affinity);
    }

    #[tokio::test]
    async fn welcome_and_delete() {
        let db = setup().await;
        let f = farmer("+911");
        insert_farmer(&db, &f).await.unwrap();

        mark_welcome_sent(&db, &f.id, "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();
        let stored = get_farmer(&db, &f.id).await.unwrap().unwrap();
        assert!(stored.welcome_sent);
        assert_eq!(stored.welcome_sent_at.as_deref(), Some("2026-01-01T00:00:00.000Z"));

        assert!(delete_farmer(&db, &f.id).await.unwrap());
        assert!(!delete_farmer(&db, &f.id).await.unwrap());
    }
}
