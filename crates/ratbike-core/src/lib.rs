//! Core library for RatBike.
//!
//! Bikes live in two interchangeable data sources, a local store and a
//! remote store. [`BikesRepository`] sits in front of both with an in-process
//! cache and is the single point of access for callers:
//!
//! - `models`: the `Bike` value type, its parts checklist and list filters
//! - `source`: the `BikesDataSource` contract and its in-memory, simulated
//!   remote and JSON-file implementations
//! - `cache`: the insertion-ordered bike map shared by the repository and
//!   the in-memory source
//! - `repository`: the tiered cache → local → remote repository
//! - `config`: user configuration and data directory resolution

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod source;
pub mod util;

pub use config::Config;
pub use error::{DataError, Result};
pub use models::{Bike, BikePart, BikesFilter, Parts};
pub use repository::BikesRepository;
pub use source::{BikesDataSource, InMemoryDataSource, JsonFileDataSource, RemoteDataSource};
