//! In-process bike storage.
//!
//! `BikeMap` keeps bikes keyed by id in insertion order. The repository uses
//! it as its cache and `InMemoryDataSource` uses it as its backing store, so
//! both list bikes in the order they were first added.

pub mod bike_map;

pub use bike_map::BikeMap;
