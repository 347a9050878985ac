use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::crypto::{Blake3KeyDerivation, KeyDerivation};
use crate::feed::Feed;
use crate::store::Store;

/// Everything an operation needs besides an identity: the store, the
/// options, the time source and the pod key derivation.
///
/// Cheap to clone; read-only after construction.
#[derive(Debug, Clone)]
pub struct Context {
    feed: Feed,
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    keys: Arc<dyn KeyDerivation>,
}

impl Context {
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            feed: Feed::new(store),
            config: Arc::new(config),
            clock: Arc::new(SystemClock::new()),
            keys: Arc::new(Blake3KeyDerivation),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_derivation(mut self, keys: Arc<dyn KeyDerivation>) -> Self {
        self.keys = keys;
        self
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn store(&self) -> &Store {
        self.feed.store()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn keys(&self) -> &dyn KeyDerivation {
        self.keys.as_ref()
    }
}
