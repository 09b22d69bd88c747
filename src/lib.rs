/// Error types for the observation tracker
pub mod error;

/// Observation and investigation report types
pub mod observations;

/// Injectable random source
pub mod random;

/// Observation store with generation and annotation operations
pub mod store;

/// Time metric aggregation over observation snapshots
pub mod aggregator;

/// HTTP transport binding
pub mod api;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use error::{ConfigError, FetchError, StoreError};
pub use observations::{InvestigationReport, Observation, ObservationStatus, ObservationSummary};
