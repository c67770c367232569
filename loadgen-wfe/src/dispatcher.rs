//! Rate-controlled dispatch loop
//!
//! Each tick launches one independent call and then sleeps `1s / rate`.
//! The rate is read fresh on every tick, so changes apply to the next
//! interval without restarting the loop. Calls are never awaited by the
//! loop; shutdown waits for the in-flight count to reach zero instead.

use crate::actions::ActionExecutor;
use crate::error::{WfeError, WfeResult};
use crate::registration::RegistrationStore;
use crate::selector::{DispatchContext, WeightedSelector};
use loadgen_resilience::InFlightTracker;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Calls per second, adjustable while a run is in progress
#[derive(Debug)]
pub struct RateController {
    calls_per_second: AtomicU64,
}

impl RateController {
    pub fn new(calls_per_second: u64) -> WfeResult<Self> {
        if calls_per_second == 0 {
            return Err(WfeError::InvalidRate);
        }
        Ok(Self {
            calls_per_second: AtomicU64::new(calls_per_second),
        })
    }

    pub fn rate(&self) -> u64 {
        self.calls_per_second.load(Ordering::Relaxed)
    }

    pub fn set_rate(&self, calls_per_second: u64) -> WfeResult<()> {
        if calls_per_second == 0 {
            return Err(WfeError::InvalidRate);
        }
        let previous = self.calls_per_second.swap(calls_per_second, Ordering::Relaxed);
        info!("Dispatch rate changed from {}/s to {}/s", previous, calls_per_second);
        Ok(())
    }

    /// Sleep between two dispatches at the current rate
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(NANOS_PER_SEC / self.rate().max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPhase {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// Totals for one finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dispatched: u64,
    pub completed: u64,
    /// In-flight count observed once draining finished
    pub in_flight_at_finish: usize,
    pub elapsed: Duration,
}

pub struct Dispatcher {
    executor: Arc<dyn ActionExecutor>,
    store: Arc<RegistrationStore>,
    selector: Arc<WeightedSelector>,
    rate: Arc<RateController>,
    runtime: Duration,
    in_flight: Arc<InFlightTracker>,
    dispatched: AtomicU64,
    completed: Arc<AtomicU64>,
    phase: Mutex<DispatchPhase>,
    stop: watch::Sender<bool>,
}

impl Dispatcher {
    pub fn new(
        executor: Arc<dyn ActionExecutor>,
        store: Arc<RegistrationStore>,
        rate: Arc<RateController>,
        runtime: Duration,
    ) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            executor,
            store,
            selector: Arc::new(WeightedSelector::default()),
            rate,
            runtime,
            in_flight: Arc::new(InFlightTracker::new()),
            dispatched: AtomicU64::new(0),
            completed: Arc::new(AtomicU64::new(0)),
            phase: Mutex::new(DispatchPhase::Idle),
            stop,
        }
    }

    pub fn rate_controller(&self) -> Arc<RateController> {
        Arc::clone(&self.rate)
    }

    pub fn runtime(&self) -> Duration {
        self.runtime
    }

    pub fn phase(&self) -> DispatchPhase {
        *self.phase.lock()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.active_task_count()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Signal the loop to stop before the run duration elapses
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Dispatch for the configured run duration, then drain
    pub async fn run(&self) -> WfeResult<RunSummary> {
        self.transition(DispatchPhase::Idle, DispatchPhase::Running)?;
        info!(
            "Dispatching at {}/s for {:?}",
            self.rate.rate(),
            self.runtime
        );

        let started = Instant::now();
        let mut stop = self.stop.subscribe();
        let deadline = sleep(self.runtime);
        tokio::pin!(deadline);

        loop {
            if *stop.borrow_and_update() {
                info!("Stop requested, ending dispatch early");
                break;
            }

            self.dispatch_one();

            tokio::select! {
                biased;
                _ = &mut deadline => {
                    info!("Run duration elapsed, stopping dispatch");
                    self.stop.send_replace(true);
                    break;
                }
                _ = stop.changed() => {}
                _ = sleep(self.rate.interval()) => {}
            }
        }

        self.transition(DispatchPhase::Running, DispatchPhase::Draining)?;
        info!(
            "Waiting for {} in-flight calls to finish",
            self.in_flight.active_task_count()
        );
        self.in_flight.wait_idle().await;
        let in_flight_at_finish = self.in_flight.active_task_count();

        self.transition(DispatchPhase::Draining, DispatchPhase::Stopped)?;
        let summary = RunSummary {
            dispatched: self.dispatched(),
            completed: self.completed(),
            in_flight_at_finish,
            elapsed: started.elapsed(),
        };
        info!(
            "Dispatch finished: {} calls dispatched in {:?}",
            summary.dispatched, summary.elapsed
        );
        Ok(summary)
    }

    fn dispatch_one(&self) {
        let guard = self.in_flight.guard();
        let sequence = self.dispatched.fetch_add(1, Ordering::SeqCst);
        debug!("Dispatching call {}", sequence);

        let executor = Arc::clone(&self.executor);
        let store = Arc::clone(&self.store);
        let selector = Arc::clone(&self.selector);
        let completed = Arc::clone(&self.completed);

        tokio::spawn(async move {
            let _guard = guard;
            let registration = store.pick_random();
            let context = DispatchContext::for_registration(registration.as_deref());
            let action = selector.select(&context, &mut rand::thread_rng());

            if let Some(action) = action {
                executor.execute(action, registration).await;
            }
            completed.fetch_add(1, Ordering::SeqCst);
        });
    }

    fn transition(&self, from: DispatchPhase, to: DispatchPhase) -> WfeResult<()> {
        let mut phase = self.phase.lock();
        if *phase != from {
            return Err(WfeError::InvalidState(format!(
                "cannot move from {:?} to {:?}",
                *phase, to
            )));
        }
        debug!("Dispatcher phase {:?} -> {:?}", from, to);
        *phase = to;
        Ok(())
    }
}
