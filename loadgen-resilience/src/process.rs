//! Companion process lifecycle
//!
//! A failure to start is returned to the caller and aborts the run; a
//! failure to stop is returned for reporting only.

use crate::shutdown::ShutdownError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{info, warn};

/// Handle to an external process owned by a run
#[derive(Debug)]
pub struct CompanionProcess {
    program: String,
    child: Child,
}

impl CompanionProcess {
    /// Launch `program` with `args`
    pub fn start<I, S>(program: &Path, args: I) -> Result<Self, ShutdownError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let name = program.display().to_string();
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ShutdownError::SpawnFailed {
                program: name.clone(),
                source,
            })?;

        info!("Started companion process {} (pid {:?})", name, child.id());
        Ok(Self {
            program: name,
            child,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// OS process id, if the process is still running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Ask the process to exit, killing it if it is still alive after `grace`
    pub async fn stop(mut self, grace: Duration) -> Result<ExitStatus, ShutdownError> {
        info!("Stopping companion process {}", self.program);

        if let Err(e) = request_exit(&mut self.child) {
            warn!("Failed to signal {}: {}", self.program, e);
        }

        let status = match timeout(grace, self.child.wait()).await {
            Ok(waited) => waited,
            Err(_) => {
                warn!("{} still running after {:?}, killing", self.program, grace);
                match self.child.kill().await {
                    Ok(()) => self.child.wait().await,
                    Err(e) => Err(e),
                }
            }
        };

        status.map_err(|source| ShutdownError::TerminateFailed {
            program: self.program.clone(),
            source,
        })
    }
}

#[cfg(unix)]
fn request_exit(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match child.id() {
        Some(pid) => kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(Into::into),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
