//! Local data source persisted as a single JSON file.
//!
//! Bikes are stored in `bikes.json` under the data directory, wrapped with
//! the time they were written. A missing, unreadable or empty file reads as
//! `NotAvailable` so the repository falls back to the remote source.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::BikesDataSource;
use crate::cache::BikeMap;
use crate::error::DataError;
use crate::models::Bike;

/// File name of the bike store inside the data directory
const STORE_FILE: &str = "bikes.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredData<T> {
    pub data: T,
    pub saved_at: DateTime<Utc>,
}

impl<T> StoredData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            saved_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Clock skew lands here too
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

pub struct JsonFileDataSource {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl JsonFileDataSource {
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).with_context(|| {
            format!("Failed to create data directory: {}", data_dir.display())
        })?;
        Ok(Self {
            path: data_dir.join(STORE_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store file has ever been written, even if it now holds
    /// no bikes.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> Result<Option<StoredData<Vec<Bike>>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read bike store: {}", self.path.display()))?;

        let stored: StoredData<Vec<Bike>> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse bike store: {}", self.path.display()))?;

        Ok(Some(stored))
    }

    fn store(&self, bikes: Vec<Bike>) -> Result<()> {
        let stored = StoredData::new(bikes);
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write bike store: {}", self.path.display()))?;
        Ok(())
    }

    /// Stored bikes, or `NotAvailable` when there are none to offer.
    fn load_bikes(&self) -> crate::Result<Vec<Bike>> {
        let _guard = self.lock.lock().unwrap();
        match self.load() {
            Ok(Some(stored)) if !stored.data.is_empty() => Ok(stored.data),
            Ok(_) => Err(DataError::NotAvailable),
            Err(e) => {
                warn!(error = %e, "Failed to load local bikes");
                Err(DataError::NotAvailable)
            }
        }
    }

    /// Apply `change` to the stored bikes and write them back.
    fn modify(&self, op: &str, change: impl FnOnce(&mut BikeMap)) {
        let _guard = self.lock.lock().unwrap();
        let result = self.load().and_then(|stored| {
            let mut bikes = BikeMap::from_bikes(stored.map(|s| s.data).unwrap_or_default());
            change(&mut bikes);
            self.store(bikes.values())
        });
        match result {
            Ok(()) => debug!(op, path = %self.path.display(), "Local store updated"),
            Err(e) => warn!(op, error = %e, "Failed to update local store"),
        }
    }

    /// Replace the stored bikes without reading the current file, so a
    /// corrupt store can still be reset.
    fn overwrite(&self, op: &str, bikes: Vec<Bike>) {
        let _guard = self.lock.lock().unwrap();
        match self.store(bikes) {
            Ok(()) => debug!(op, path = %self.path.display(), "Local store rewritten"),
            Err(e) => warn!(op, error = %e, "Failed to rewrite local store"),
        }
    }

    /// How long ago the store was last written, if it exists.
    pub fn age_display(&self) -> Option<String> {
        let _guard = self.lock.lock().unwrap();
        match self.load() {
            Ok(stored) => stored.map(|s| s.age_display()),
            Err(e) => {
                debug!(error = %e, "Failed to load local store for age display");
                None
            }
        }
    }
}

impl BikesDataSource for JsonFileDataSource {
    async fn list(&self) -> crate::Result<Vec<Bike>> {
        self.load_bikes()
    }

    async fn get(&self, id: &str) -> crate::Result<Bike> {
        self.load_bikes()?
            .into_iter()
            .find(|b| b.id() == id)
            .ok_or(DataError::NotAvailable)
    }

    async fn save(&self, bike: &Bike) {
        self.modify("save", |bikes| {
            bikes.insert(bike.clone());
        });
    }

    async fn complete(&self, bike: &Bike) {
        self.modify("complete", |bikes| {
            bikes.insert(bike.completed());
        });
    }

    async fn activate(&self, bike: &Bike) {
        self.modify("activate", |bikes| {
            bikes.insert(bike.activated());
        });
    }

    async fn clear_completed(&self) {
        self.modify("clear_completed", |bikes| bikes.retain(|b| !b.is_complete()));
    }

    async fn delete_all(&self) {
        self.overwrite("delete_all", Vec::new());
    }

    async fn delete(&self, id: &str) {
        self.modify("delete", |bikes| {
            bikes.remove(id);
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn bike(id: &str, bike_type: &str) -> Bike {
        Bike::with_id(id, Some(bike_type.to_string()), Some("Garage".to_string()))
    }

    #[tokio::test]
    async fn test_missing_file_is_not_available() {
        let dir = tempdir().unwrap();
        let source = JsonFileDataSource::new(dir.path()).unwrap();
        assert_eq!(source.list().await, Err(DataError::NotAvailable));
        assert_eq!(source.get("a").await, Err(DataError::NotAvailable));
        assert!(source.age_display().is_none());
    }

    #[tokio::test]
    async fn test_save_persists_across_instances() {
        let dir = tempdir().unwrap();
        {
            let source = JsonFileDataSource::new(dir.path()).unwrap();
            source.save(&bike("a", "BMX")).await;
            source.save(&bike("b", "Road")).await;
        }

        let reopened = JsonFileDataSource::new(dir.path()).unwrap();
        let ids: Vec<String> = reopened
            .list()
            .await
            .unwrap()
            .iter()
            .map(|b| b.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(reopened.age_display(), Some("just now".to_string()));
    }

    #[tokio::test]
    async fn test_mutations() {
        let dir = tempdir().unwrap();
        let source = JsonFileDataSource::new(dir.path()).unwrap();
        source.save(&bike("a", "BMX")).await;
        source.save(&bike("b", "Road")).await;
        source.save(&bike("c", "Cruiser")).await;

        source.complete(&bike("a", "BMX")).await;
        assert!(source.get("a").await.unwrap().is_complete());

        source.clear_completed().await;
        assert_eq!(source.get("a").await, Err(DataError::NotAvailable));

        source.delete("b").await;
        assert_eq!(source.list().await.unwrap(), vec![bike("c", "Cruiser")]);

        source.delete_all().await;
        assert_eq!(source.list().await, Err(DataError::NotAvailable));
        // Emptied, but still there
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_not_available() {
        let dir = tempdir().unwrap();
        let source = JsonFileDataSource::new(dir.path()).unwrap();
        std::fs::write(source.path(), "not json").unwrap();
        assert_eq!(source.list().await, Err(DataError::NotAvailable));
    }

    #[tokio::test]
    async fn test_delete_all_recovers_corrupt_file() {
        let dir = tempdir().unwrap();
        let source = JsonFileDataSource::new(dir.path()).unwrap();
        std::fs::write(source.path(), "not json").unwrap();

        // Writes that merge into the file cannot apply yet
        source.save(&bike("a", "BMX")).await;
        assert_eq!(source.list().await, Err(DataError::NotAvailable));

        source.delete_all().await;
        source.save(&bike("b", "Road")).await;
        assert_eq!(source.list().await, Ok(vec![bike("b", "Road")]));
    }

    #[test]
    fn test_stored_data_age_display() {
        let fresh = StoredData::new(vec![1]);
        assert_eq!(fresh.age_display(), "just now");

        let mut old = StoredData::new(vec![1]);
        old.saved_at = Utc::now() - Duration::minutes(90);
        assert_eq!(old.age_display(), "1h ago");

        old.saved_at = Utc::now() - Duration::days(3);
        assert_eq!(old.age_display(), "3d ago");
    }
}
