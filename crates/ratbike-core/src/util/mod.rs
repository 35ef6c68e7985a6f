//! Shared async utilities.

pub mod coalesce;

pub use coalesce::Coalescer;
