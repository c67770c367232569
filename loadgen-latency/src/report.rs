//! Serializable latency summary

use crate::errors::LatencyError;
use crate::recorder::{Datapoint, Outcome};
use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whole-run latency report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyReport {
    pub title: String,
    pub started: Option<DateTime<Utc>>,
    pub stopped: Option<DateTime<Utc>>,
    pub classes: BTreeMap<String, ClassSummary>,
}

impl LatencyReport {
    /// Length of the recording window, when both ends are set
    pub fn window_ms(&self) -> Option<i64> {
        match (self.started, self.stopped) {
            (Some(started), Some(stopped)) => Some((stopped - started).num_milliseconds()),
            _ => None,
        }
    }
}

/// Statistics for one call class; latencies in microseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSummary {
    pub calls: u64,
    pub good: u64,
    pub error: u64,
    pub min_us: u64,
    pub p50_us: u64,
    pub p90_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub datapoints: Vec<Datapoint>,
}

impl ClassSummary {
    pub fn from_datapoints(datapoints: Vec<Datapoint>) -> Result<Self, LatencyError> {
        let mut histogram =
            Histogram::<u64>::new(3).map_err(|e| LatencyError::Histogram(e.to_string()))?;
        let mut good = 0;

        for point in &datapoints {
            histogram
                .record(point.latency_us())
                .map_err(|e| LatencyError::Histogram(e.to_string()))?;
            if point.outcome == Outcome::Good {
                good += 1;
            }
        }

        let calls = datapoints.len() as u64;
        Ok(Self {
            calls,
            good,
            error: calls - good,
            min_us: histogram.min(),
            p50_us: histogram.value_at_quantile(0.50),
            p90_us: histogram.value_at_quantile(0.90),
            p99_us: histogram.value_at_quantile(0.99),
            max_us: histogram.max(),
            mean_us: histogram.mean(),
            datapoints,
        })
    }
}
