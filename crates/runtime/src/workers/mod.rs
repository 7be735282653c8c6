//! Worker tasks that back the battle service.
//!
//! The aggregation worker drains usage counters off the battle path so a
//! conclusion never waits on analytics storage.

mod aggregation;

pub use aggregation::{AggregationHandle, AggregationWorker, Command};
