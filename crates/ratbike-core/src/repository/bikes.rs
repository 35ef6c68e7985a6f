use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::BikeMap;
use crate::error::{DataError, Result};
use crate::models::Bike;
use crate::source::BikesDataSource;
use crate::util::Coalescer;

/// How far the cached bikes can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    /// No full list has been loaded yet. Single bikes may still be cached.
    Uninitialized,
    /// The cache holds the full list.
    Fresh,
    /// The next `list()` must go to remote.
    Dirty,
}

struct CacheState {
    bikes: BikeMap,
    freshness: Freshness,
    /// Bumped by `invalidate()` and by every write. A list load only
    /// replaces the cache if neither happened while it was in flight.
    generation: u64,
}

/// Loads bikes from whichever tier has them first and keeps all tiers in
/// sync on writes.
///
/// Concurrent `list()` calls of the same generation share one source fetch,
/// and concurrent `get()` calls for the same id share one lookup.
pub struct BikesRepository<R, L> {
    remote: R,
    local: L,
    state: Mutex<CacheState>,
    list_flights: Coalescer<u64, Result<Vec<Bike>>>,
    get_flights: Coalescer<String, Result<Bike>>,
}

impl<R, L> BikesRepository<R, L>
where
    R: BikesDataSource,
    L: BikesDataSource,
{
    pub fn new(remote: R, local: L) -> Self {
        Self {
            remote,
            local,
            state: Mutex::new(CacheState {
                bikes: BikeMap::new(),
                freshness: Freshness::Uninitialized,
                generation: 0,
            }),
            list_flights: Coalescer::new(),
            get_flights: Coalescer::new(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every bike, from the cache when it is fresh, otherwise from local or
    /// (when dirty, or local has nothing) from remote.
    pub async fn list(&self) -> Result<Vec<Bike>> {
        let generation = {
            let state = self.state.lock().await;
            if state.freshness == Freshness::Fresh {
                debug!(count = state.bikes.len(), "Serving bikes from cache");
                return Ok(state.bikes.values());
            }
            state.generation
        };

        self.list_flights
            .run(generation, || self.load_list(generation))
            .await
    }

    async fn load_list(&self, generation: u64) -> Result<Vec<Bike>> {
        let dirty = self.state.lock().await.freshness == Freshness::Dirty;

        if !dirty {
            match self.local.list().await {
                Ok(bikes) => {
                    debug!(count = bikes.len(), "Loaded bikes from local source");
                    return Ok(self.refresh_cache(generation, bikes).await);
                }
                Err(_) => debug!("Local bikes not available, falling back to remote"),
            }
        }

        self.list_from_remote(generation).await
    }

    async fn list_from_remote(&self, generation: u64) -> Result<Vec<Bike>> {
        let bikes = match self.remote.list().await {
            Ok(bikes) => bikes,
            Err(e) => {
                warn!("Remote bikes not available");
                return Err(e);
            }
        };
        info!(count = bikes.len(), "Refreshed bikes from remote");

        self.refresh_local(&bikes).await;
        Ok(self.refresh_cache(generation, bikes).await)
    }

    /// Replace the cache with `bikes` unless an invalidation or a write
    /// happened since the load started, in which case the cache is left for
    /// the next refresh.
    async fn refresh_cache(&self, generation: u64, bikes: Vec<Bike>) -> Vec<Bike> {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(
                loaded = generation,
                current = state.generation,
                "Cache changed during load, not caching result"
            );
            return bikes;
        }
        state.bikes.replace_all(bikes);
        state.freshness = Freshness::Fresh;
        state.bikes.values()
    }

    /// Make local mirror `bikes`.
    async fn refresh_local(&self, bikes: &[Bike]) {
        self.local.delete_all().await;
        for bike in bikes {
            self.local.save(bike).await;
        }
    }

    /// One bike, looked up in the cache, then local, then remote.
    pub async fn get(&self, id: &str) -> Result<Bike> {
        if let Some(bike) = self.cached(id).await {
            debug!(id, "Serving bike from cache");
            return Ok(bike);
        }

        self.get_flights
            .run(id.to_string(), || self.load_bike(id))
            .await
    }

    async fn load_bike(&self, id: &str) -> Result<Bike> {
        match self.local.get(id).await {
            Ok(bike) => {
                debug!(id, "Loaded bike from local source");
                self.cache_insert(bike.clone()).await;
                return Ok(bike);
            }
            Err(_) => debug!(id, "Bike not in local source, asking remote"),
        }

        match self.remote.get(id).await {
            Ok(bike) => {
                debug!(id, "Loaded bike from remote source");
                self.local.save(&bike).await;
                self.cache_insert(bike.clone()).await;
                Ok(bike)
            }
            Err(e) => {
                debug!(id, "Bike not available from any source");
                Err(e)
            }
        }
    }

    async fn cached(&self, id: &str) -> Option<Bike> {
        self.state.lock().await.bikes.get(id).cloned()
    }

    async fn cache_insert(&self, bike: Bike) {
        self.state.lock().await.bikes.insert(bike);
    }

    /// Apply a write to the cache. Any list load still in flight was read
    /// before this write and must not replace the cache.
    async fn write_cache(&self, apply: impl FnOnce(&mut CacheState)) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        apply(&mut *state);
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store a new or replaced bike in remote, local and the cache.
    pub async fn save(&self, bike: Bike) {
        self.remote.save(&bike).await;
        self.local.save(&bike).await;
        debug!(id = bike.id(), "Saved bike");
        self.write_cache(|state| {
            state.bikes.insert(bike);
        })
        .await;
    }

    pub async fn complete(&self, bike: &Bike) {
        self.remote.complete(bike).await;
        self.local.complete(bike).await;
        self.write_cache(|state| {
            state.bikes.insert(bike.completed());
        })
        .await;
    }

    /// Complete the cached bike with this id.
    ///
    /// Returns `NotAvailable` without touching any source when the id is not
    /// in the cache.
    pub async fn complete_by_id(&self, id: &str) -> Result<()> {
        let bike = self.resolve(id).await?;
        self.complete(&bike).await;
        Ok(())
    }

    pub async fn activate(&self, bike: &Bike) {
        self.remote.activate(bike).await;
        self.local.activate(bike).await;
        self.write_cache(|state| {
            state.bikes.insert(bike.activated());
        })
        .await;
    }

    /// Activate the cached bike with this id. Same resolution rules as
    /// [`complete_by_id`](Self::complete_by_id).
    pub async fn activate_by_id(&self, id: &str) -> Result<()> {
        let bike = self.resolve(id).await?;
        self.activate(&bike).await;
        Ok(())
    }

    async fn resolve(&self, id: &str) -> Result<Bike> {
        self.cached(id).await.ok_or_else(|| {
            warn!(id, "Bike id not in cache");
            DataError::NotAvailable
        })
    }

    /// Drop every complete bike from all tiers.
    ///
    /// Freshness is unchanged: a cache that has not loaded the full list yet
    /// still lacks the active bikes, so the next `list()` must read them.
    pub async fn clear_completed(&self) {
        self.remote.clear_completed().await;
        self.local.clear_completed().await;
        self.write_cache(|state| state.bikes.retain(|b| !b.is_complete()))
            .await;
    }

    /// Delete every bike. The empty cache is then the full list, unless a
    /// remote refresh is already pending.
    pub async fn delete_all(&self) {
        self.remote.delete_all().await;
        self.local.delete_all().await;
        self.write_cache(|state| {
            state.bikes.clear();
            if state.freshness != Freshness::Dirty {
                state.freshness = Freshness::Fresh;
            }
        })
        .await;
    }

    pub async fn delete(&self, id: &str) {
        self.remote.delete(id).await;
        self.local.delete(id).await;
        self.write_cache(|state| {
            state.bikes.remove(id);
        })
        .await;
    }

    /// Force the next `list()` to refresh from remote.
    ///
    /// Cached bikes stay in place and `get()` keeps serving them until that
    /// refresh completes.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.freshness = Freshness::Dirty;
        state.generation += 1;
        debug!(generation = state.generation, "Bike cache marked dirty");
    }
}

// ============================================================================
// Tests
// ============================================================================
