//! Time sources for feed writes and metadata timestamps.
//!
//! Feed epochs are addressed in milliseconds. Two writes to the same topic
//! must never be stamped with the same instant, so [`SystemClock`] is strictly
//! monotonic. Metadata records carry unix seconds, see [`Clock::now_secs`].

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait Clock: Send + Sync + Debug {
    /// Current time in unix milliseconds
    fn now_millis(&self) -> u64;

    /// Current time in unix seconds
    fn now_secs(&self) -> i64 {
        (self.now_millis() / 1000) as i64
    }
}

/// Wall clock that never returns the same millisecond twice
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        let wall = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

/// A clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_millis)),
        }
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
