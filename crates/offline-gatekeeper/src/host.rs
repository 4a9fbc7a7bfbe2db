//! Lifecycle host: drives a worker through install and activation and routes
//! fetches to it once it controls its pages.

use std::sync::Arc;
use std::time::{Duration, Instant};

use offline_core::{
    ActivateOutcome, InstallOutcome, LifecycleObserver, Request, Response, Worker, WorkerError,
    WorkerState,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Error type for host operations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Worker is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: WorkerState,
    },

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Owns one worker instance and its lifecycle state.
pub struct WorkerHost<W> {
    worker: W,
    state: RwLock<WorkerState>,
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl<W: Worker> WorkerHost<W> {
    /// Create a host for a freshly parsed worker.
    pub fn new(worker: W) -> Self {
        Self {
            worker,
            state: RwLock::new(WorkerState::Parsed),
            observers: Vec::new(),
        }
    }

    /// Register a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn worker(&self) -> &W {
        &self.worker
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Run the install handler.
    ///
    /// On failure the worker becomes `Redundant` and may be installed again.
    pub async fn install(&self) -> Result<InstallOutcome, HostError> {
        let started = self
            .enter(WorkerState::can_install, "parsed or redundant", WorkerState::Installing)
            .await?;

        match self.worker.on_install().await {
            Ok(outcome) => {
                self.transition(WorkerState::Installed, started).await;
                Ok(outcome)
            }
            Err(error) => {
                warn!(error = %error, "Install handler failed");
                self.transition(WorkerState::Redundant, started).await;
                Err(error.into())
            }
        }
    }

    /// Run the activate handler.
    pub async fn activate(&self) -> Result<ActivateOutcome, HostError> {
        let started = self
            .enter(WorkerState::can_activate, "installed", WorkerState::Activating)
            .await?;

        match self.worker.on_activate().await {
            Ok(outcome) => {
                self.transition(WorkerState::Activated, started).await;
                Ok(outcome)
            }
            Err(error) => {
                warn!(error = %error, "Activate handler failed");
                self.transition(WorkerState::Redundant, started).await;
                Err(error.into())
            }
        }
    }

    /// Install, then activate immediately when the worker asks to skip
    /// waiting.
    pub async fn start(&self) -> Result<(InstallOutcome, Option<ActivateOutcome>), HostError> {
        let installed = self.install().await?;
        if !installed.skip_waiting {
            debug!("Worker installed, waiting for activation");
            return Ok((installed, None));
        }

        let activated = self.activate().await?;
        Ok((installed, Some(activated)))
    }

    /// Route a request to the worker.
    ///
    /// Returns `None` while the worker does not control its pages; the caller
    /// then goes to the network directly.
    pub async fn dispatch_fetch(&self, request: Request) -> Option<Response> {
        let state = self.state().await;
        if !state.can_intercept_fetch() {
            debug!(state = %state, url = %request.url(), "Worker not active, fetch not intercepted");
            return None;
        }

        Some(self.worker.on_fetch(request).await)
    }

    /// Check the precondition and move into the in-progress state under one
    /// write lock.
    async fn enter(
        &self,
        allowed: fn(&WorkerState) -> bool,
        expected: &'static str,
        next: WorkerState,
    ) -> Result<Instant, HostError> {
        let mut state = self.state.write().await;
        if !allowed(&*state) {
            return Err(HostError::InvalidState {
                expected,
                actual: *state,
            });
        }

        let from = *state;
        *state = next;
        drop(state);

        self.notify(from, next, Duration::ZERO);
        Ok(Instant::now())
    }

    async fn transition(&self, to: WorkerState, started: Instant) {
        let from = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, to)
        };

        let elapsed = started.elapsed();
        info!(from = %from, to = %to, elapsed_ms = elapsed.as_millis() as u64, "Worker state changed");
        self.notify(from, to, elapsed);
    }

    fn notify(&self, from: WorkerState, to: WorkerState, elapsed: Duration) {
        for observer in &self.observers {
            observer.on_transition(from, to, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeWorker {
        fail_install: AtomicBool,
        skip_waiting: bool,
        installs: AtomicUsize,
    }

    impl FakeWorker {
        fn new(skip_waiting: bool) -> Self {
            Self {
                fail_install: AtomicBool::new(false),
                skip_waiting,
                installs: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Worker for FakeWorker {
        async fn on_install(&self) -> Result<InstallOutcome, WorkerError> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            if self.fail_install.load(Ordering::SeqCst) {
                return Err(WorkerError::Install {
                    url: "https://app.example/".into(),
                    reason: "offline".into(),
                });
            }
            Ok(InstallOutcome {
                cached: 3,
                skip_waiting: self.skip_waiting,
            })
        }

        async fn on_activate(&self) -> Result<ActivateOutcome, WorkerError> {
            Ok(ActivateOutcome {
                deleted: vec!["v0".into()],
                claim_clients: true,
            })
        }

        async fn on_fetch(&self, _request: Request) -> Response {
            Response::ok("from worker")
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        transitions: Mutex<Vec<(WorkerState, WorkerState)>>,
    }

    impl LifecycleObserver for RecordingObserver {
        fn on_transition(&self, from: WorkerState, to: WorkerState, _elapsed: Duration) {
            self.transitions.lock().unwrap().push((from, to));
        }
    }

    // === Lifecycle Tests ===

    #[tokio::test]
    async fn test_start_installs_and_activates() {
        let host = WorkerHost::new(FakeWorker::new(true));

        let (installed, activated) = host.start().await.unwrap();

        assert_eq!(installed.cached, 3);
        assert_eq!(activated.unwrap().deleted, vec!["v0".to_string()]);
        assert_eq!(host.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_start_without_skip_waiting_stays_installed() {
        let host = WorkerHost::new(FakeWorker::new(false));

        let (_, activated) = host.start().await.unwrap();

        assert!(activated.is_none());
        assert_eq!(host.state().await, WorkerState::Installed);

        host.activate().await.unwrap();
        assert_eq!(host.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_failed_install_is_redundant_and_retryable() {
        let worker = FakeWorker::new(true);
        worker.fail_install.store(true, Ordering::SeqCst);
        let host = WorkerHost::new(worker);

        let err = host.install().await.unwrap_err();
        assert!(matches!(err, HostError::Worker(WorkerError::Install { .. })));
        assert_eq!(host.state().await, WorkerState::Redundant);

        host.worker().fail_install.store(false, Ordering::SeqCst);
        host.install().await.unwrap();
        assert_eq!(host.state().await, WorkerState::Installed);
        assert_eq!(host.worker().installs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_activate_before_install_rejected() {
        let host = WorkerHost::new(FakeWorker::new(true));

        let err = host.activate().await.unwrap_err();

        assert!(matches!(
            err,
            HostError::InvalidState {
                actual: WorkerState::Parsed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_install_twice_rejected() {
        let host = WorkerHost::new(FakeWorker::new(true));
        host.start().await.unwrap();

        assert!(matches!(
            host.install().await,
            Err(HostError::InvalidState { .. })
        ));
    }

    // === Dispatch Tests ===

    #[tokio::test]
    async fn test_no_interception_before_activation() {
        let host = WorkerHost::new(FakeWorker::new(false));
        let request = || Request::get("https://app.example/app.js").unwrap();

        assert!(host.dispatch_fetch(request()).await.is_none());

        host.install().await.unwrap();
        assert!(host.dispatch_fetch(request()).await.is_none());

        host.activate().await.unwrap();
        let response = host.dispatch_fetch(request()).await.unwrap();
        assert_eq!(response.text(), "from worker");
    }

    // === Observer Tests ===

    #[tokio::test]
    async fn test_observer_sees_every_transition() {
        let observer = Arc::new(RecordingObserver::default());
        let host = WorkerHost::new(FakeWorker::new(true)).with_observer(observer.clone());

        host.start().await.unwrap();

        let transitions = observer.transitions.lock().unwrap().clone();
        assert_eq!(
            transitions,
            vec![
                (WorkerState::Parsed, WorkerState::Installing),
                (WorkerState::Installing, WorkerState::Installed),
                (WorkerState::Installed, WorkerState::Activating),
                (WorkerState::Activating, WorkerState::Activated),
            ]
        );
    }
}
