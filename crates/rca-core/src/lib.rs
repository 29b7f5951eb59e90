//! Shared error taxonomy and value types for recipe-agent crates.

pub mod error;
pub mod types;

pub use error::{ApiError, ErrorKind, RETRYABLE_STATUS_CODES};
pub use types::{Mode, ParamValue, Units};
