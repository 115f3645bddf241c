//! Command processing root.
//!
//! Per-tick momentum command aggregation and the seam to the QP solver.

pub mod aggregator;
pub mod consumer;

pub use aggregator::{MomentumCommandAggregator, MomentumCommandBundle};
pub use consumer::{NullConsumer, QpCommandConsumer, RecordingConsumer};
