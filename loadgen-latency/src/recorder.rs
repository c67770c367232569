//! Thread-safe latency recorder

use crate::errors::LatencyError;
use crate::report::{ClassSummary, LatencyReport};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Outcome tag attached to every datapoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Good,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Good => "good",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timed nonce fetch or call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datapoint {
    pub sent: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub outcome: Outcome,
}

impl Datapoint {
    /// Elapsed time in microseconds, clamped at zero
    pub fn latency_us(&self) -> u64 {
        (self.finished - self.sent)
            .num_microseconds()
            .unwrap_or(i64::MAX)
            .max(0) as u64
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Window {
    started: Option<DateTime<Utc>>,
    stopped: Option<DateTime<Utc>>,
}

/// Per-call-class latency map for one run
#[derive(Debug)]
pub struct CallLatency {
    title: String,
    window: RwLock<Window>,
    classes: Mutex<BTreeMap<String, Vec<Datapoint>>>,
}

impl CallLatency {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            window: RwLock::new(Window::default()),
            classes: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Open the recording window
    pub fn start(&self) {
        let now = Utc::now();
        self.window.write().started = Some(now);
        debug!("Latency window opened at {}", now);
    }

    /// Freeze the end of the recording window
    pub fn stop(&self) {
        let now = Utc::now();
        self.window.write().stopped = Some(now);
        debug!("Latency window closed at {}", now);
    }

    pub fn started(&self) -> Option<DateTime<Utc>> {
        self.window.read().started
    }

    pub fn stopped(&self) -> Option<DateTime<Utc>> {
        self.window.read().stopped
    }

    /// Record one nonce fetch or call under its class label
    pub fn add(&self, class: &str, sent: DateTime<Utc>, finished: DateTime<Utc>, outcome: Outcome) {
        let point = Datapoint {
            sent,
            finished,
            outcome,
        };
        let mut classes = self.classes.lock();
        match classes.get_mut(class) {
            Some(points) => points.push(point),
            None => {
                classes.insert(class.to_string(), vec![point]);
            }
        }
    }

    /// Number of datapoints recorded for a class
    pub fn count(&self, class: &str) -> usize {
        self.classes.lock().get(class).map_or(0, Vec::len)
    }

    /// Total datapoints across all classes
    pub fn total(&self) -> usize {
        self.classes.lock().values().map(Vec::len).sum()
    }

    /// Summarize everything recorded so far
    pub fn report(&self) -> Result<LatencyReport, LatencyError> {
        let window = *self.window.read();
        let classes = self.classes.lock().clone();

        let mut summaries = BTreeMap::new();
        for (class, points) in classes {
            summaries.insert(class, ClassSummary::from_datapoints(points)?);
        }

        Ok(LatencyReport {
            title: self.title.clone(),
            started: window.started,
            stopped: window.stopped,
            classes: summaries,
        })
    }

    /// Write the report as JSON; a missing path is a no-op
    pub fn dump(&self, path: Option<&Path>) -> Result<(), LatencyError> {
        let Some(path) = path else {
            return Ok(());
        };

        let report = self.report()?;
        let data = serde_json::to_vec(&report)?;
        std::fs::write(path, data)?;
        info!(
            "Wrote latency report with {} call classes to {}",
            report.classes.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_window() {
        let latency = CallLatency::new("test");
        assert!(latency.started().is_none());

        latency.start();
        latency.stop();

        let (started, stopped) = (latency.started().unwrap(), latency.stopped().unwrap());
        assert!(stopped >= started);
    }

    #[test]
    fn test_add_groups_by_class() {
        let latency = CallLatency::new("test");
        let now = Utc::now();

        latency.add("HEAD /acme/new-reg", now, now + Duration::milliseconds(5), Outcome::Good);
        latency.add("HEAD /acme/new-reg", now, now + Duration::milliseconds(7), Outcome::Error);
        latency.add("POST /acme/new-reg", now, now + Duration::milliseconds(20), Outcome::Good);

        assert_eq!(latency.count("HEAD /acme/new-reg"), 2);
        assert_eq!(latency.count("POST /acme/new-reg"), 1);
        assert_eq!(latency.count("POST /acme/new-cert"), 0);
        assert_eq!(latency.total(), 3);
    }

    #[test]
    fn test_latency_clamps_negative() {
        let now = Utc::now();
        let point = Datapoint {
            sent: now,
            finished: now - Duration::milliseconds(1),
            outcome: Outcome::Good,
        };
        assert_eq!(point.latency_us(), 0);
    }

    #[test]
    fn test_concurrent_add() {
        let latency = std::sync::Arc::new(CallLatency::new("test"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let latency = latency.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let now = Utc::now();
                        latency.add("POST /acme/new-authz", now, now, Outcome::Good);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(latency.count("POST /acme/new-authz"), 800);
    }
}
