/// Observation and investigation report batch generation
pub mod generator;
pub mod observation_store;

pub use observation_store::{InvestigationAssignment, ObservationStore, StoreSettings};
