//! Run lifecycle: wiring, companion process, latency window and persistence

use crate::actions::{AcmeActions, ActionExecutor};
use crate::dispatcher::{DispatchPhase, Dispatcher, RateController, RunSummary};
use crate::error::WfeResult;
use crate::nonce::NoncePool;
use crate::registration::RegistrationStore;
use crate::snapshot::{RestoreSummary, SnapshotRecord};
use crate::transport::SigningTransport;
use loadgen_config::{ChallengeServerConfig, LoadGenConfig};
use loadgen_http::{build_client, HttpConfig};
use loadgen_latency::CallLatency;
use loadgen_resilience::CompanionProcess;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Everything one load generation run shares
pub struct LoadState {
    store: Arc<RegistrationStore>,
    latency: Arc<CallLatency>,
    transport: Arc<SigningTransport>,
    dispatcher: Dispatcher,
    challenge_server: ChallengeServerConfig,
    companion_pid: Mutex<Option<u32>>,
}

impl LoadState {
    pub fn new(config: &LoadGenConfig) -> WfeResult<Self> {
        let target = &config.target;
        let client = build_client(&HttpConfig::from(config.http.clone()))?;

        let latency = Arc::new(CallLatency::new(format!(
            "WFE -- {:?} test at {} base actions / second",
            target.runtime, target.rate
        )));
        let store = Arc::new(RegistrationStore::new(target.max_registrations));
        let nonces = Arc::new(NoncePool::new(
            client.clone(),
            target.api_base.clone(),
            Arc::clone(&latency),
        ));
        let transport = Arc::new(SigningTransport::new(
            client,
            target.api_base.clone(),
            nonces,
        ));
        let actions = AcmeActions::new(
            Arc::clone(&transport),
            Arc::clone(&store),
            Arc::clone(&latency),
            target.terms_url.clone(),
            target.domain_base.clone(),
        )?;

        let rate = Arc::new(RateController::new(target.rate)?);
        let dispatcher =
            Dispatcher::new(Arc::new(actions), Arc::clone(&store), rate, target.runtime);

        Ok(Self {
            store,
            latency,
            transport,
            dispatcher,
            challenge_server: config.challenge_server.clone(),
            companion_pid: Mutex::new(None),
        })
    }

    /// Replace the bundled actions, keeping rate and runtime
    pub fn with_executor(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        let rate = self.dispatcher.rate_controller();
        let runtime = self.dispatcher.runtime();
        self.dispatcher = Dispatcher::new(executor, Arc::clone(&self.store), rate, runtime);
        self
    }

    pub fn store(&self) -> &Arc<RegistrationStore> {
        &self.store
    }

    pub fn latency(&self) -> &Arc<CallLatency> {
        &self.latency
    }

    pub fn transport(&self) -> &Arc<SigningTransport> {
        &self.transport
    }

    pub fn rate_controller(&self) -> Arc<RateController> {
        self.dispatcher.rate_controller()
    }

    pub fn phase(&self) -> DispatchPhase {
        self.dispatcher.phase()
    }

    /// Process id of the companion started by the latest run
    pub fn companion_pid(&self) -> Option<u32> {
        *self.companion_pid.lock()
    }

    /// End dispatch early; in-flight calls still finish
    pub fn stop(&self) {
        self.dispatcher.stop();
    }

    /// Start the companion process, dispatch, drain and tear down
    pub async fn run(&self) -> WfeResult<RunSummary> {
        let companion = self.start_companion()?;
        *self.companion_pid.lock() = companion.as_ref().and_then(CompanionProcess::id);

        self.latency.start();
        let result = self.dispatcher.run().await;

        if let Some(companion) = companion {
            let program = companion.program().to_string();
            if let Err(e) = companion.stop(self.challenge_server.shutdown_grace).await {
                error!("Error stopping challenge server {}: {}", program, e);
            }
        }
        self.latency.stop();

        let summary = result?;
        info!(
            "Run complete: {} dispatched, {} completed, {} latency datapoints",
            summary.dispatched,
            summary.completed,
            self.latency.total()
        );
        Ok(summary)
    }

    /// Write the latency report; no path means no report
    pub fn dump(&self, path: Option<&Path>) -> WfeResult<()> {
        Ok(self.latency.dump(path)?)
    }

    pub fn snapshot(&self) -> WfeResult<Vec<u8>> {
        self.store.snapshot()?.to_json()
    }

    pub fn restore(&self, content: &[u8]) -> WfeResult<RestoreSummary> {
        let record = SnapshotRecord::from_json(content)?;
        Ok(self.store.restore(record))
    }

    pub async fn save_snapshot(&self, path: &Path) -> WfeResult<()> {
        let content = self.snapshot()?;
        tokio::fs::write(path, content).await?;
        info!("Saved {} registrations to {}", self.store.len(), path.display());
        Ok(())
    }

    pub async fn load_snapshot(&self, path: &Path) -> WfeResult<RestoreSummary> {
        let content = tokio::fs::read(path).await?;
        self.restore(&content)
    }

    fn start_companion(&self) -> WfeResult<Option<CompanionProcess>> {
        if !self.challenge_server.enabled {
            return Ok(None);
        }
        let Some(binary) = &self.challenge_server.binary else {
            return Ok(None);
        };
        let process = CompanionProcess::start(binary, self.challenge_server.command_args())?;
        Ok(Some(process))
    }
}
