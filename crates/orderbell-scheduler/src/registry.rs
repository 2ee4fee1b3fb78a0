use std::collections::HashMap;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use orderbell_types::models::Credentials;

/// Handle to a registration's poll task.
#[derive(Debug)]
pub struct TaskHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(cancel: CancellationToken, join: JoinHandle<()>) -> Self {
        Self { cancel, join }
    }

    /// Stop future ticks. A tick already running is left to finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to exit.
    pub async fn finished(self) {
        let _ = self.join.await;
    }
}

/// A monitored user, keyed by device push token.
#[derive(Debug)]
pub struct Registration {
    pub credentials: Credentials,
    pub push_token: String,
    /// Reserved for de-duplicating notifications; never set.
    pub last_order_id: Option<String>,
    task: TaskHandle,
}

impl Registration {
    pub fn new(credentials: Credentials, push_token: String, task: TaskHandle) -> Self {
        Self {
            credentials,
            push_token,
            last_order_id: None,
            task,
        }
    }
}

/// Active registrations. Every entry's task is live; anything that leaves
/// the map has its task cancelled on the way out, so each push token has
/// at most one scheduled task.
///
/// Cancelled tasks may still be finishing a tick. Their handles are kept
/// until they exit so [`Registry::drain`] can hand them back for joining.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, Registration>,
    retired: Vec<TaskHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, push_token: &str) -> bool {
        self.entries.contains_key(push_token)
    }

    /// Cancelled tasks that have not exited yet.
    pub fn retired(&self) -> usize {
        self.retired.iter().filter(|t| !t.is_finished()).count()
    }

    /// Store a registration. Any previous one for the same push token is
    /// cancelled and its credentials returned.
    pub fn insert(&mut self, registration: Registration) -> Option<Credentials> {
        let previous = self
            .entries
            .insert(registration.push_token.clone(), registration)?;
        Some(self.retire(previous))
    }

    /// Remove and cancel. `None` if the token was not registered.
    pub fn remove(&mut self, push_token: &str) -> Option<Credentials> {
        let removed = self.entries.remove(push_token)?;
        Some(self.retire(removed))
    }

    /// Cancel everything and return every task that may still be running,
    /// registered or retired.
    pub fn drain(&mut self) -> Vec<TaskHandle> {
        let mut tasks: Vec<TaskHandle> = self.retired.drain(..).collect();
        for (_, reg) in self.entries.drain() {
            reg.task.cancel();
            tasks.push(reg.task);
        }
        tasks
    }

    fn retire(&mut self, registration: Registration) -> Credentials {
        registration.task.cancel();
        self.retired.retain(|t| !t.is_finished());
        self.retired.push(registration.task);
        registration.credentials
    }
}
