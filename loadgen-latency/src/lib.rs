//! Latency recording for load generation runs
//!
//! A [`CallLatency`] collects one datapoint per nonce fetch or call, keyed by
//! a call-class label such as `HEAD /acme/new-reg`, inside a recording window
//! bounded by [`CallLatency::start`] and [`CallLatency::stop`]. The summary
//! is serialized to JSON at the end of the run.

pub mod errors;
pub mod recorder;
pub mod report;

pub use errors::LatencyError;
pub use recorder::{CallLatency, Datapoint, Outcome};
pub use report::{ClassSummary, LatencyReport};
