//! Simulated network-backed data source.
//!
//! Reads wait out an artificial latency before answering; writes apply
//! immediately. There is no real server behind it. A reachable remote with no
//! bikes answers `list()` with an empty list; only a disconnected one fails.

use std::time::Duration;

use tracing::debug;

use super::{BikesDataSource, InMemoryDataSource};
use crate::error::Result;
use crate::models::{Bike, BikePart, Parts};

/// Latency applied to reads when none is configured.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(5000);

pub struct RemoteDataSource {
    store: InMemoryDataSource,
    latency: Duration,
}

impl RemoteDataSource {
    /// Create an empty remote with the given read latency.
    pub fn new(latency: Duration) -> Self {
        Self::with_bikes(latency, Vec::new())
    }

    pub fn with_bikes(latency: Duration, bikes: impl IntoIterator<Item = Bike>) -> Self {
        Self {
            store: InMemoryDataSource::with_bikes(bikes),
            latency,
        }
    }

    /// Remote seeded with the two demo bikes.
    pub fn with_sample_data(latency: Duration) -> Self {
        Self::with_bikes(latency, sample_bikes())
    }

    /// Simulate losing (or regaining) the connection.
    pub fn set_available(&self, available: bool) {
        self.store.set_available(available);
    }

    pub fn read_count(&self) -> usize {
        self.store.read_count()
    }

    pub fn snapshot(&self) -> Vec<Bike> {
        self.store.snapshot()
    }

    async fn simulate_network(&self) {
        if !self.latency.is_zero() {
            debug!(latency_ms = self.latency.as_millis() as u64, "Simulating remote latency");
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn sample_bikes() -> Vec<Bike> {
    let mut parts: Parts = [false; BikePart::COUNT];
    for part in [BikePart::Frame, BikePart::Fork, BikePart::Handlebar, BikePart::Chain] {
        parts[part.index()] = true;
    }

    vec![
        Bike::new(
            Some("Mountain".to_string()),
            Some("Behind the library, leaning on the fence".to_string()),
        )
        .with_parts(parts),
        Bike::new(
            Some("Road".to_string()),
            Some("Bike rack outside the train station".to_string()),
        )
        .with_complete(true),
    ]
}

impl BikesDataSource for RemoteDataSource {
    async fn list(&self) -> Result<Vec<Bike>> {
        self.simulate_network().await;
        self.store.list_all()
    }

    async fn get(&self, id: &str) -> Result<Bike> {
        self.simulate_network().await;
        self.store.get(id).await
    }

    async fn save(&self, bike: &Bike) {
        self.store.save(bike).await
    }

    async fn complete(&self, bike: &Bike) {
        self.store.complete(bike).await
    }

    async fn activate(&self, bike: &Bike) {
        self.store.activate(bike).await
    }

    async fn clear_completed(&self) {
        self.store.clear_completed().await
    }

    async fn delete_all(&self) {
        self.store.delete_all().await
    }

    async fn delete(&self, id: &str) {
        self.store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;

    #[tokio::test(start_paused = true)]
    async fn test_reads_wait_for_latency() {
        let remote = RemoteDataSource::with_sample_data(DEFAULT_LATENCY);
        let started = tokio::time::Instant::now();

        let bikes = remote.list().await.unwrap();

        assert_eq!(bikes.len(), 2);
        assert!(started.elapsed() >= DEFAULT_LATENCY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_do_not_wait() {
        let remote = RemoteDataSource::new(DEFAULT_LATENCY);
        let started = tokio::time::Instant::now();
        let bike = Bike::new(Some("BMX".to_string()), None);

        remote.save(&bike).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(remote.snapshot(), vec![bike]);
    }

    #[tokio::test]
    async fn test_sample_data_has_one_complete_bike() {
        let remote = RemoteDataSource::with_sample_data(Duration::ZERO);
        let bikes = remote.list().await.unwrap();
        assert_eq!(bikes.iter().filter(|b| b.is_complete()).count(), 1);
        assert!(bikes.iter().all(|b| !b.is_empty()));
    }

    #[tokio::test]
    async fn test_empty_remote_lists_nothing() {
        let remote = RemoteDataSource::new(Duration::ZERO);
        assert_eq!(remote.list().await, Ok(vec![]));

        remote.save(&Bike::new(Some("BMX".to_string()), None)).await;
        remote.delete_all().await;
        assert_eq!(remote.list().await, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_disconnected_remote() {
        let remote = RemoteDataSource::with_sample_data(Duration::ZERO);
        remote.set_available(false);
        assert_eq!(remote.list().await, Err(DataError::NotAvailable));
        assert_eq!(remote.read_count(), 1);
    }
}
