//! Data models for RatBike entities.
//!
//! - `Bike`: immutable bike record with its parts checklist
//! - `BikePart`: the known part categories, in checklist order
//! - `BikesFilter`: All / Active / Completed list filtering

pub mod bike;
pub mod filter;

pub use bike::{Bike, BikePart, Parts};
pub use filter::BikesFilter;
