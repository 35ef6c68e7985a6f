//! The bike repository: one access point over a local source, a remote
//! source and an in-process cache.
//!
//! Reads go cache → local → remote, each hit populating the faster tiers.
//! Writes go to remote, then local, then the cache. `invalidate()` forces the
//! next `list()` to refresh from remote.

pub mod bikes;

pub use bikes::BikesRepository;
