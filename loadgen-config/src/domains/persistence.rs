//! Snapshot and report file locations

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File locations read before and written after a run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Registration snapshot restored at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_in: Option<PathBuf>,

    /// Where to save the registration snapshot after the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_out: Option<PathBuf>,

    /// Where to write the latency report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_report: Option<PathBuf>,
}

impl Validatable for PersistenceConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (name, path) in [
            ("snapshot_in", &self.snapshot_in),
            ("snapshot_out", &self.snapshot_out),
            ("latency_report", &self.latency_report),
        ] {
            if let Some(path) = path {
                if path.as_os_str().is_empty() {
                    return Err(self.validation_error(format!("{} cannot be empty", name)));
                }
            }
        }

        if let (Some(input), Some(report)) = (&self.snapshot_in, &self.latency_report) {
            if input == report {
                return Err(
                    self.validation_error("latency_report would overwrite snapshot_in")
                );
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "persistence"
    }
}
