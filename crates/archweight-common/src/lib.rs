//! archweight-common: Shared error type and configuration used across all Archweight crates.

pub mod error;
pub mod weighting_config;

// Re-export commonly used types
pub use error::{Result, WeightingError};
pub use weighting_config::{Orientation, WeightingConfig};
