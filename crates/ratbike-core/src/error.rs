use thiserror::Error;

/// The only failure the repository reports to its callers.
///
/// Sources collapse "not found", "store empty" and "unreachable" into this
/// one signal. Local misses are recovered by falling back to remote; only a
/// miss at the last tier reaches the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Data not available")]
    NotAvailable,
}

pub type Result<T> = std::result::Result<T, DataError>;
