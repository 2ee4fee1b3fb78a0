//! Instrumented fakes for the scheduler's collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use orderbell_push::{Notifier, PushError, PushGateway, PushMessage};
use orderbell_scheduler::{Scheduler, TickPipeline};
use orderbell_types::models::{Credentials, Order, count_new_orders};
use orderbell_upstream::{AuthResult, Authenticator, BearerToken, OrderFeed, UpstreamError};

/// Accepts a single password for any username; can be taken "down".
pub struct FakeAuth {
    password: String,
    down: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeAuth {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for FakeAuth {
    async fn authenticate(&self, credentials: &Credentials) -> AuthResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) || credentials.password != self.password {
            return AuthResult::Failed;
        }
        AuthResult::Authenticated(BearerToken::new(format!("token-{}", credentials.username)))
    }
}

/// Serves a fixed list of order statuses, optionally after a delay.
#[derive(Default)]
pub struct FakeOrders {
    statuses: Mutex<Vec<i64>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeOrders {
    pub fn set_statuses(&self, statuses: &[i64]) {
        *self.statuses.lock().unwrap() = statuses.to_vec();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderFeed for FakeOrders {
    async fn fetch_new_orders(&self, _token: &BearerToken) -> Result<usize, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let orders: Vec<Order> = self
            .statuses
            .lock()
            .unwrap()
            .iter()
            .map(|&status| Order {
                status,
                fields: Default::default(),
            })
            .collect();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(count_new_orders(&orders))
    }
}

#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<PushMessage>>,
}

impl RecordingGateway {
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for RecordingGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct Harness {
    pub scheduler: Scheduler,
    pub auth: Arc<FakeAuth>,
    pub orders: Arc<FakeOrders>,
    pub gateway: Arc<RecordingGateway>,
}

/// Scheduler on the default 30 s interval whose auth accepts password "pw".
pub fn harness() -> Harness {
    let auth = Arc::new(fake_auth());
    let orders = Arc::new(FakeOrders::default());
    let gateway = Arc::new(RecordingGateway::default());

    let pipeline = TickPipeline::new(auth.clone(), orders.clone(), Notifier::new(gateway.clone()));
    Harness {
        scheduler: Scheduler::new(pipeline),
        auth,
        orders,
        gateway,
    }
}

pub fn fake_auth() -> FakeAuth {
    FakeAuth {
        password: "pw".into(),
        down: AtomicBool::new(false),
        calls: AtomicUsize::new(0),
    }
}

pub fn creds(username: &str, password: &str) -> Credentials {
    Credentials::new(username, password)
}

/// Advance the paused clock, letting every due tick run.
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Let spawned tasks observe cancellation.
pub async fn settle() {
    advance(Duration::from_millis(1)).await;
}
