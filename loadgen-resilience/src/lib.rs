//! Shutdown coordination for load generation runs
//!
//! This crate tracks in-flight calls so a run can drain before it is
//! declared finished, and manages the lifecycle of the external companion
//! process started alongside a run.

pub mod process;
pub mod shutdown;

// Re-export commonly used types
pub use process::CompanionProcess;
pub use shutdown::{InFlightGuard, InFlightTracker, ShutdownError};
