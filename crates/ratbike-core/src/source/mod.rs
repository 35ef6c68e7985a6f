//! Data sources the repository reads from and writes through to.
//!
//! - `InMemoryDataSource`: insertion-ordered store, switchable offline
//! - `RemoteDataSource`: in-memory store behind simulated network latency
//! - `JsonFileDataSource`: local store persisted as a JSON file

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::models::Bike;

pub mod local;
pub mod memory;
pub mod remote;

pub use local::JsonFileDataSource;
pub use memory::InMemoryDataSource;
pub use remote::RemoteDataSource;

/// Storage the repository can read bikes from and push changes to.
///
/// Reads report [`DataError::NotAvailable`](crate::DataError::NotAvailable)
/// when the source cannot be reached or has no such bike. Local stores also
/// report an empty `list()` that way so the repository falls back to the
/// remote; the remote answers an empty list as `Ok`. Mutations are
/// fire-and-forget: implementations log their own failures.
pub trait BikesDataSource: Send + Sync {
    /// Every stored bike.
    fn list(&self) -> impl Future<Output = Result<Vec<Bike>>> + Send;

    /// One bike by id.
    fn get(&self, id: &str) -> impl Future<Output = Result<Bike>> + Send;

    /// Insert or replace a bike.
    fn save(&self, bike: &Bike) -> impl Future<Output = ()> + Send;

    /// Store `bike` marked complete.
    fn complete(&self, bike: &Bike) -> impl Future<Output = ()> + Send;

    /// Store `bike` marked incomplete.
    fn activate(&self, bike: &Bike) -> impl Future<Output = ()> + Send;

    /// Drop every complete bike.
    fn clear_completed(&self) -> impl Future<Output = ()> + Send;

    fn delete_all(&self) -> impl Future<Output = ()> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = ()> + Send;
}

impl<T: BikesDataSource> BikesDataSource for Arc<T> {
    async fn list(&self) -> Result<Vec<Bike>> {
        self.as_ref().list().await
    }

    async fn get(&self, id: &str) -> Result<Bike> {
        self.as_ref().get(id).await
    }

    async fn save(&self, bike: &Bike) {
        self.as_ref().save(bike).await
    }

    async fn complete(&self, bike: &Bike) {
        self.as_ref().complete(bike).await
    }

    async fn activate(&self, bike: &Bike) {
        self.as_ref().activate(bike).await
    }

    async fn clear_completed(&self) {
        self.as_ref().clear_completed().await
    }

    async fn delete_all(&self) {
        self.as_ref().delete_all().await
    }

    async fn delete(&self, id: &str) {
        self.as_ref().delete(id).await
    }
}
