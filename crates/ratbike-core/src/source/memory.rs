use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use tracing::debug;

use super::BikesDataSource;
use crate::cache::BikeMap;
use crate::error::{DataError, Result};
use crate::models::Bike;

/// An in-memory implementation of `BikesDataSource`.
///
/// An empty store answers `list()` with `NotAvailable`, so a repository in
/// front of it falls back to its next tier. `set_available(false)` simulates a
/// disconnected source: reads fail and writes are dropped.
pub struct InMemoryDataSource {
    bikes: RwLock<BikeMap>,
    available: AtomicBool,
    reads: AtomicUsize,
}

impl InMemoryDataSource {
    /// Create a new empty in-memory source.
    pub fn new() -> Self {
        Self::with_bikes(Vec::new())
    }

    pub fn with_bikes(bikes: impl IntoIterator<Item = Bike>) -> Self {
        Self {
            bikes: RwLock::new(BikeMap::from_bikes(bikes)),
            available: AtomicBool::new(true),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of `list()` and `get()` calls served so far, including failed ones.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Current contents, without counting as a read.
    pub fn snapshot(&self) -> Vec<Bike> {
        self.bikes.read().unwrap().values()
    }

    /// Every stored bike, even when there are none. Fails only while unavailable.
    pub(crate) fn list_all(&self) -> Result<Vec<Bike>> {
        self.begin_read()?;
        Ok(self.bikes.read().unwrap().values())
    }

    fn begin_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.is_available() {
            Ok(())
        } else {
            Err(DataError::NotAvailable)
        }
    }

    fn write(&self, op: &str, apply: impl FnOnce(&mut BikeMap)) {
        if !self.is_available() {
            debug!(op, "Source unavailable, dropping write");
            return;
        }
        let mut bikes = self.bikes.write().unwrap();
        apply(&mut bikes);
    }
}

impl Default for InMemoryDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BikesDataSource for InMemoryDataSource {
    async fn list(&self) -> Result<Vec<Bike>> {
        let bikes = self.list_all()?;
        if bikes.is_empty() {
            return Err(DataError::NotAvailable);
        }
        Ok(bikes)
    }

    async fn get(&self, id: &str) -> Result<Bike> {
        self.begin_read()?;
        let bikes = self.bikes.read().unwrap();
        bikes.get(id).cloned().ok_or(DataError::NotAvailable)
    }

    async fn save(&self, bike: &Bike) {
        self.write("save", |bikes| {
            bikes.insert(bike.clone());
        });
    }

    async fn complete(&self, bike: &Bike) {
        self.write("complete", |bikes| {
            bikes.insert(bike.completed());
        });
    }

    async fn activate(&self, bike: &Bike) {
        self.write("activate", |bikes| {
            bikes.insert(bike.activated());
        });
    }

    async fn clear_completed(&self) {
        self.write("clear_completed", |bikes| bikes.retain(|b| !b.is_complete()));
    }

    async fn delete_all(&self) {
        self.write("delete_all", |bikes| bikes.clear());
    }

    async fn delete(&self, id: &str) {
        self.write("delete", |bikes| {
            bikes.remove(id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bike(id: &str) -> Bike {
        Bike::with_id(id, Some("BMX".to_string()), None)
    }

    #[tokio::test]
    async fn test_empty_list_is_not_available() {
        let source = InMemoryDataSource::new();
        assert_eq!(source.list().await, Err(DataError::NotAvailable));
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let source = InMemoryDataSource::new();
        source.save(&bike("a")).await;

        assert_eq!(source.get("a").await, Ok(bike("a")));
        source.delete("a").await;
        assert_eq!(source.get("a").await, Err(DataError::NotAvailable));
        assert_eq!(source.read_count(), 2);
    }

    #[tokio::test]
    async fn test_complete_activate_and_clear() {
        let source = InMemoryDataSource::with_bikes(vec![bike("a"), bike("b")]);
        source.complete(&bike("a")).await;
        assert!(source.get("a").await.unwrap().is_complete());

        source.activate(&bike("a")).await;
        assert!(source.get("a").await.unwrap().is_active());

        source.complete(&bike("b")).await;
        source.clear_completed().await;
        let ids: Vec<String> = source.snapshot().iter().map(|b| b.id().to_string()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[tokio::test]
    async fn test_unavailable_source_fails_reads_and_drops_writes() {
        let source = InMemoryDataSource::with_bikes(vec![bike("a")]);
        source.set_available(false);

        assert_eq!(source.list().await, Err(DataError::NotAvailable));
        assert_eq!(source.get("a").await, Err(DataError::NotAvailable));
        source.save(&bike("b")).await;
        source.delete_all().await;

        source.set_available(true);
        assert_eq!(source.snapshot(), vec![bike("a")]);
    }
}
