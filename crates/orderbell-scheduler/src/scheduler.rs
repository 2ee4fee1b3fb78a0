use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use orderbell_types::models::Credentials;

use crate::registry::{Registration, Registry, TaskHandle};
use crate::tick::TickPipeline;

/// Time between ticks for each registration.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    #[error("scheduler is shut down")]
    ShutDown,
}

/// Owns the registry and one poll task per registration.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    pipeline: TickPipeline,
    interval: Duration,

    /// Registrations by push token. Swaps and removals happen under this lock.
    registry: Mutex<Registry>,

    /// Parent of every poll task's cancellation token.
    shutdown: CancellationToken,

    /// Poll tasks that have not exited yet.
    live_tasks: Arc<AtomicUsize>,
}

impl Scheduler {
    pub fn new(pipeline: TickPipeline) -> Self {
        Self::with_interval(pipeline, POLL_INTERVAL)
    }

    /// # Panics
    ///
    /// If `interval` is zero.
    pub fn with_interval(pipeline: TickPipeline, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "poll interval must be non-zero");
        Self {
            inner: Arc::new(SchedulerInner {
                pipeline,
                interval,
                registry: Mutex::new(Registry::new()),
                shutdown: CancellationToken::new(),
                live_tasks: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Verify the credentials, then start polling for `push_token`.
    ///
    /// Re-registering a token swaps in the new credentials and restarts its
    /// timer; the token is never observed as unregistered in between.
    pub async fn register(
        &self,
        credentials: Credentials,
        push_token: impl Into<String>,
    ) -> Result<(), RegisterError> {
        let push_token = push_token.into();
        if credentials.username.is_empty() {
            return Err(RegisterError::InvalidRequest("username is required"));
        }
        if credentials.password.is_empty() {
            return Err(RegisterError::InvalidRequest("password is required"));
        }
        if push_token.is_empty() {
            return Err(RegisterError::InvalidRequest("fcmToken is required"));
        }
        if self.inner.shutdown.is_cancelled() {
            return Err(RegisterError::ShutDown);
        }

        if !self.inner.pipeline.authenticate(&credentials).await.is_success() {
            warn!(username = %credentials.username, "registration rejected: invalid credentials");
            return Err(RegisterError::InvalidCredentials);
        }

        let mut registry = self.inner.registry.lock().await;
        // shutdown() cancels before taking the lock, so this check can't race a drain.
        if self.inner.shutdown.is_cancelled() {
            return Err(RegisterError::ShutDown);
        }

        let task = self.spawn_poller(credentials.clone(), push_token.clone());
        let username = credentials.username.clone();
        let replaced = registry.insert(Registration::new(credentials, push_token.clone(), task));

        if replaced.is_some() {
            info!(%username, %push_token, "registration renewed, previous poller cancelled");
        } else {
            info!(%username, %push_token, total = registry.len(), "registered");
        }
        Ok(())
    }

    /// Stop polling for `push_token`. Returns whether it was registered.
    pub async fn unregister(&self, push_token: &str) -> bool {
        let removed = self.inner.registry.lock().await.remove(push_token);
        match &removed {
            Some(credentials) => info!(username = %credentials.username, push_token, "unregistered"),
            None => debug!(push_token, "unregister for unknown token"),
        }
        removed.is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.registry.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.registry.lock().await.is_empty()
    }

    pub async fn is_registered(&self, push_token: &str) -> bool {
        self.inner.registry.lock().await.contains(push_token)
    }

    /// Number of poll tasks still running, including cancelled ones that
    /// are finishing an in-flight tick.
    pub fn scheduled_tasks(&self) -> usize {
        self.inner.live_tasks.load(Ordering::SeqCst)
    }

    /// Drop every registration and wait for in-flight ticks to finish,
    /// including those of registrations already replaced or removed.
    /// Later registrations are refused.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let tasks = self.inner.registry.lock().await.drain();
        info!(count = tasks.len(), "stopping pollers");

        for task in tasks {
            task.finished().await;
        }
    }

    fn spawn_poller(&self, credentials: Credentials, push_token: String) -> TaskHandle {
        let cancel = self.inner.shutdown.child_token();
        let live = LiveTask::enter(self.inner.live_tasks.clone());
        let join = tokio::spawn(poll_loop(
            self.inner.pipeline.clone(),
            self.inner.interval,
            credentials,
            push_token,
            cancel.clone(),
            live,
        ));
        TaskHandle::new(cancel, join)
    }
}

/// Counts a poll task as live until dropped.
struct LiveTask(Arc<AtomicUsize>);

impl LiveTask {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveTask {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs ticks one after another, so two ticks for the same registration
/// never overlap. A tick that overruns the interval swallows the ticks it
/// missed. Cancellation is only observed between ticks.
async fn poll_loop(
    pipeline: TickPipeline,
    period: Duration,
    credentials: Credentials,
    push_token: String,
    cancel: CancellationToken,
    _live: LiveTask,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        debug!(username = %credentials.username, "checking orders");
        let outcome = pipeline.run_tick(&credentials, &push_token).await;
        debug!(username = %credentials.username, ?outcome, "tick finished");
    }

    debug!(%push_token, "poller stopped");
}
