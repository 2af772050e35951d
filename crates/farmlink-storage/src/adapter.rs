// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use tracing::debug;

use farmlink_config::model::StorageConfig;
use farmlink_core::{
    ApprovalStatus, Farmer, FarmerAffinity, FarmerStore, FarmlinkError, GradeResult,
    HealthStatus, Listing, ListingStore, OrderDetails, StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed store for farmers and listings.
///
/// Every operation delegates to the typed query modules over a single
/// [`Database`] handle.
#[derive(Debug)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the database described by `config`, applying migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, FarmlinkError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self { db })
    }

    /// Empty in-memory store, for tests and dry runs.
    pub async fn in_memory() -> Result<Self, FarmlinkError> {
        Ok(Self {
            db: Database::open_in_memory().await?,
        })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl FarmerStore for SqliteStore {
    async fn insert_farmer(&self, farmer: &Farmer) -> Result<(), FarmlinkError> {
        queries::farmers::insert_farmer(&self.db, farmer).await
    }

    async fn get_farmer(&self, id: &str) -> Result<Option<Farmer>, FarmlinkError> {
        queries::farmers::get_farmer(&self.db, id).await
    }

    async fn find_farmer_by_phone(&self, phone: &str) -> Result<Option<Farmer>, FarmlinkError> {
        queries::farmers::find_farmer_by_phone(&self.db, phone).await
    }

    async fn list_farmers(
        &self,
        status: Option<ApprovalStatus>,
    ) -> Result<Vec<Farmer>, FarmlinkError> {
        queries::farmers::list_farmers(&self.db, status).await
    }

    async fn update_farmer(&self, farmer: &Farmer) -> Result<(), FarmlinkError> {
        queries::farmers::update_farmer(&self.db, farmer).await
    }

    async fn record_affinity(
        &self,
        phone: &str,
        affinity: &FarmerAffinity,
    ) -> Result<(), FarmlinkError> {
        queries::farmers::record_affinity(&self.db, phone, affinity).await
    }

    async fn mark_welcome_sent(&self, id: &str, sent_at: &str) -> Result<(), FarmlinkError> {
        queries::farmers::mark_welcome_sent(&self.db, id, sent_at).await
    }

    async fn delete_farmer(&self, id: &str) -> Result<bool, FarmlinkError> {
        queries::farmers::delete_farmer(&self.db, id).await
    }
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn insert_listing(&self, listing: &Listing) -> Result<(), FarmlinkError> {
        queries::listings::insert_listing(&self.db, listing).await
    }

    async fn get_listing(&self, id: &str) -> Result<Option<Listing>, FarmlinkError> {
        queries::listings::get_listing(&self.db, id).await
    }

    async fn list_available(&self, limit: i64) -> Result<Vec<Listing>, FarmlinkError> {
        queries::listings::list_available(&self.db, limit).await
    }

    async fn list_by_farmer(&self, phone: &str) -> Result<Vec<Listing>, FarmlinkError> {
        queries::listings::list_by_farmer(&self.db, phone).await
    }

    async fn mark_ordered(
        &self,
        id: &str,
        order: &OrderDetails,
    ) -> Result<Option<Listing>, FarmlinkError> {
        queries::listings::mark_ordered(&self.db, id, order).await
    }

    async fn set_image_url(&self, id: &str, image_url: &str) -> Result<(), FarmlinkError> {
        queries::listings::set_image_url(&self.db, id, image_url).await
    }

    async fn record_grade(&self, id: &str, grade: &GradeResult) -> Result<(), FarmlinkError> {
        queries::listings::record_grade(&self.db, id, grade).await
    }

    async fn settle_default_grade(&self, id: &str) -> Result<(), FarmlinkError> {
        queries::listings::settle_default_grade(&self.db, id).await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStore {
    async fn health_check(&self) -> Result<HealthStatus, FarmlinkError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn close(&self) -> Result<(), FarmlinkError> {
        self.db.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn config(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir
                .path()
                .join("data/farmlink.db")
                .to_string_lossy()
                .to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn open_creates_parent_directory_and_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&config(&dir)).await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(dir.path().join("data/farmlink.db").exists());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let farmer = Farmer::register("Ravi", "+919876543210", "Hosur", "Krishnagiri", "");
        {
            let store = SqliteStore::open(&config(&dir)).await.unwrap();
            store.insert_farmer(&farmer).await.unwrap();
            let listing = Listing::for_farmer(&farmer, "Tomato", "30 kg", "", false);
            store.insert_listing(&listing).await.unwrap();
            store.close().await.unwrap();
        }

        let store = SqliteStore::open(&config(&dir)).await.unwrap();
        let found = store
            .find_farmer_by_phone("+919876543210")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, farmer.id);
        assert_eq!(store.list_by_farmer(&farmer.phone).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_orders_have_one_winner() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let farmer = Farmer::register("Ravi", "+919876543210", "Hosur", "Krishnagiri", "");
        let listing = Listing::for_farmer(&farmer, "Tomato", "30 kg", "", false);
        store.insert_listing(&listing).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            let id = listing.id.clone();
            handles.push(tokio::spawn(async move {
                let order = OrderDetails {
                    buyer_name: format!("buyer-{i}"),
                    buyer_phone: String::new(),
                    ordered_at: farmlink_core::types::now_timestamp(),
                };
                store.mark_ordered(&id, &order).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let store: Arc<dyn StorageAdapter> = Arc::new(SqliteStore::in_memory().await.unwrap());
        assert!(store.list_farmers(None).await.unwrap().is_empty());
        assert!(store.list_available(50).await.unwrap().is_empty());
    }
}
