//! Dispatch loop timing and drain behaviour under a paused clock

use async_trait::async_trait;
use loadgen_wfe::{
    ActionExecutor, ActionKind, DispatchPhase, Dispatcher, RateController, Registration,
    RegistrationStore,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Records when each call started and takes `work` to finish
struct RecordingExecutor {
    calls: Mutex<Vec<(ActionKind, Instant)>>,
    work: Duration,
}

impl RecordingExecutor {
    fn new(work: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            work,
        })
    }

    fn started_at(&self) -> Vec<Instant> {
        let mut times: Vec<_> = self.calls.lock().iter().map(|(_, at)| *at).collect();
        times.sort();
        times
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, action: ActionKind, _registration: Option<Arc<Registration>>) {
        self.calls.lock().push((action, Instant::now()));
        tokio::time::sleep(self.work).await;
    }
}

fn dispatcher(executor: Arc<RecordingExecutor>, rate: u64, runtime: Duration) -> Dispatcher {
    Dispatcher::new(
        executor,
        Arc::new(RegistrationStore::default()),
        Arc::new(RateController::new(rate).unwrap()),
        runtime,
    )
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_count_follows_rate_and_drains() {
    // each call outlives several ticks
    let executor = RecordingExecutor::new(Duration::from_millis(350));
    let dispatcher = dispatcher(executor.clone(), 10, Duration::from_millis(500));
    assert_eq!(dispatcher.phase(), DispatchPhase::Idle);

    let summary = dispatcher.run().await.unwrap();

    assert!(
        (4..=6).contains(&summary.dispatched),
        "dispatched {}",
        summary.dispatched
    );
    assert_eq!(summary.in_flight_at_finish, 0);
    assert_eq!(summary.completed, summary.dispatched);
    assert_eq!(dispatcher.in_flight(), 0);
    assert_eq!(dispatcher.phase(), DispatchPhase::Stopped);
    assert_eq!(executor.calls.lock().len() as u64, summary.dispatched);
}

#[tokio::test(start_paused = true)]
async fn test_empty_store_dispatches_identity_creation() {
    let executor = RecordingExecutor::new(Duration::ZERO);
    let dispatcher = dispatcher(executor.clone(), 20, Duration::from_millis(200));

    dispatcher.run().await.unwrap();

    let calls = executor.calls.lock();
    assert!(!calls.is_empty());
    assert!(calls
        .iter()
        .all(|(action, _)| *action == ActionKind::CreateIdentity));
}

#[tokio::test(start_paused = true)]
async fn test_rate_change_applies_to_later_ticks() {
    let executor = RecordingExecutor::new(Duration::from_millis(10));
    let dispatcher = dispatcher(executor.clone(), 10, Duration::from_secs(1));

    let rate = dispatcher.rate_controller();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        rate.set_rate(2).unwrap();
    });

    let summary = dispatcher.run().await.unwrap();

    let gaps: Vec<u128> = executor
        .started_at()
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_millis())
        .collect();
    assert_eq!(gaps, vec![100, 100, 100, 500]);
    assert_eq!(summary.dispatched, 5);
    assert_eq!(summary.completed, 5);
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_dispatch_early() {
    let executor = RecordingExecutor::new(Duration::from_millis(50));
    let dispatcher = Arc::new(dispatcher(executor.clone(), 10, Duration::from_secs(60)));

    let stopper = Arc::clone(&dispatcher);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        stopper.stop();
    });

    let started = Instant::now();
    let summary = dispatcher.run().await.unwrap();

    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.in_flight_at_finish, 0);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_runs_once() {
    let executor = RecordingExecutor::new(Duration::ZERO);
    let dispatcher = dispatcher(executor, 10, Duration::from_millis(100));

    dispatcher.run().await.unwrap();
    assert!(dispatcher.run().await.is_err());
}
