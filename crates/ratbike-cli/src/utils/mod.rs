//! Utility functions for string formatting.

pub mod format;

pub use format::{format_optional, short_id, truncate_string};
