//! Per-user polling: who is registered, and the timer that drives
//! login -> order fetch -> notification for each of them.

pub mod registry;
pub mod scheduler;
pub mod tick;

pub use registry::{Registration, Registry};
pub use scheduler::{POLL_INTERVAL, RegisterError, Scheduler};
pub use tick::{TickOutcome, TickPipeline};
