/// Observation sources and the time metric aggregator
pub mod source;
pub mod time_aggregator;

pub use source::{FetchFuture, HttpObservationSource, ObservationSource};
pub use time_aggregator::{sum_durations, Metric, TimeAggregator};
