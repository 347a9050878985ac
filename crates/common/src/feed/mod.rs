//! Versioned single-writer feeds
//!
//! A feed is the version chain of one [`Topic`] under one owner. Every
//! version is a single-owner chunk at `topic.address(epoch, owner)`; the
//! epoch of each write is derived from the epoch of the write before it, so
//! no index of versions is kept anywhere.
//!
//! Each update's payload is prefixed with its write time (unix ms, big
//! endian), which lets a reader ask for the latest version as of any moment.
//!
//! Writers must not have two writes to the same topic in flight at once: the
//! second write derives its epoch from the first write's result.

mod epoch;
mod lookup;
mod topic;

pub use epoch::{base_time, Epoch, HIGHEST_LEVEL, LOWEST_LEVEL};
pub use lookup::find_latest;
pub use topic::Topic;

use crate::crypto::{Address, SecretKey};
use crate::store::{ChunkStoreError, Reference, SingleOwnerChunk, Store};

const TIMESTAMP_SIZE: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("store error: {0}")]
    Store(#[from] ChunkStoreError),
    #[error("no feed update found")]
    NotFound,
    #[error("invalid feed chunk at {0}: {1}")]
    InvalidChunk(Reference, String),
    #[error("epoch {0} is already taken by the previous update")]
    EpochCollision(Epoch),
    #[error("epoch {0} already holds a different update")]
    Conflict(Epoch),
}

/// The latest version found by a lookup, and where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupAnswer {
    pub data: Vec<u8>,
    pub epoch: Epoch,
    /// When the version was written, unix ms
    pub time: u64,
}

#[derive(Debug, Clone)]
pub struct Feed {
    store: Store,
}

impl Feed {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Read the version stored at `epoch`, if one is visible at `at`
    async fn read_epoch(
        &self,
        topic: Topic,
        owner: &Address,
        epoch: Epoch,
        at: u64,
    ) -> Result<Option<(u64, Vec<u8>)>, FeedError> {
        let address = topic.address(&epoch, owner);
        let raw = match self.store.try_get(&address).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let chunk = SingleOwnerChunk::decode(&raw)
            .map_err(|e| FeedError::InvalidChunk(address, e.to_string()))?;
        if chunk.owner() != *owner {
            return Err(FeedError::InvalidChunk(
                address,
                format!("signed by {} instead of {}", chunk.owner(), owner),
            ));
        }
        if *chunk.identifier() != topic.identifier(&epoch) {
            return Err(FeedError::InvalidChunk(address, "identifier mismatch".into()));
        }

        let payload = chunk.into_payload();
        if payload.len() < TIMESTAMP_SIZE {
            return Err(FeedError::InvalidChunk(address, "missing timestamp".into()));
        }
        let mut time = [0u8; TIMESTAMP_SIZE];
        time.copy_from_slice(&payload[..TIMESTAMP_SIZE]);
        let time = u64::from_be_bytes(time);
        if time > at {
            return Ok(None);
        }
        Ok(Some((time, payload[TIMESTAMP_SIZE..].to_vec())))
    }

    /// Find the latest version of `topic` written by `owner` at or before `at`
    pub async fn lookup(
        &self,
        topic: &Topic,
        owner: &Address,
        at: u64,
    ) -> Result<LookupAnswer, FeedError> {
        self.try_lookup(topic, owner, at)
            .await?
            .ok_or(FeedError::NotFound)
    }

    /// Like [`Feed::lookup`] but an empty feed is `None`
    pub async fn try_lookup(
        &self,
        topic: &Topic,
        owner: &Address,
        at: u64,
    ) -> Result<Option<LookupAnswer>, FeedError> {
        let topic = *topic;
        let found =
            find_latest(at, None, move |epoch| self.read_epoch(topic, owner, epoch, at)).await?;
        match found {
            Some((epoch, (time, data))) => {
                tracing::debug!("feed::lookup: {:?} found at {}", topic, epoch);
                Ok(Some(LookupAnswer { data, epoch, time }))
            }
            None => {
                tracing::debug!("feed::lookup: {:?} has no update at {}", topic, at);
                Ok(None)
            }
        }
    }

    /// Write `data` as the version after `previous`.
    ///
    /// `previous` must be the latest version of this same topic; `None`
    /// starts a new chain. Returns the epoch written. Replaying an update
    /// that is already stored succeeds; a different update already at the
    /// epoch is a [`FeedError::Conflict`].
    pub async fn write_next(
        &self,
        topic: &Topic,
        signer: &SecretKey,
        previous: Option<&LookupAnswer>,
        data: &[u8],
        at: u64,
    ) -> Result<Epoch, FeedError> {
        let epoch = match previous {
            Some(previous) => {
                let next = previous.epoch.next(at);
                if next == previous.epoch {
                    return Err(FeedError::EpochCollision(next));
                }
                next
            }
            None => Epoch::first(at),
        };

        let mut payload = Vec::with_capacity(TIMESTAMP_SIZE + data.len());
        payload.extend_from_slice(&at.to_be_bytes());
        payload.extend_from_slice(data);

        let chunk = SingleOwnerChunk::new(topic.identifier(&epoch), payload, signer);
        match self.store.put_soc(&chunk).await {
            Ok(_) => {}
            Err(ChunkStoreError::ChunkExists(address)) => {
                // only a replay of this very update may land on a taken epoch
                let existing = self.store.get(&address).await?;
                let same = SingleOwnerChunk::decode(&existing)
                    .map(|found| found.payload() == chunk.payload())
                    .unwrap_or(false);
                if !same {
                    tracing::warn!(
                        "feed::write_next: {:?} at {} was written concurrently",
                        topic,
                        epoch
                    );
                    return Err(FeedError::Conflict(epoch));
                }
                tracing::debug!("feed::write_next: {} already uploaded", address);
            }
            Err(e) => return Err(e.into()),
        }
        tracing::debug!("feed::write_next: {:?} written at {}", topic, epoch);
        Ok(epoch)
    }

    /// Look up the latest version of `topic` and write `data` after it
    pub async fn update(
        &self,
        topic: &Topic,
        signer: &SecretKey,
        data: &[u8],
        at: u64,
    ) -> Result<Epoch, FeedError> {
        let previous = self.try_lookup(topic, &signer.address(), at).await?;
        self.write_next(topic, signer, previous.as_ref(), data, at)
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn setup() -> (Feed, SecretKey) {
        (Feed::new(Store::memory()), SecretKey::generate().unwrap())
    }

    #[tokio::test]
    async fn test_lookup_empty_feed() {
        let (feed, owner) = setup();
        let topic = Topic::new("/");
        assert!(matches!(
            feed.lookup(&topic, &owner.address(), 1_000).await,
            Err(FeedError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_then_lookup() {
        let (feed, owner) = setup();
        let topic = Topic::new("/docs");

        let first = feed.update(&topic, &owner, b"v1", 1_000).await.unwrap();
        assert_eq!(first, Epoch::first(1_000));
        let second = feed.update(&topic, &owner, b"v2", 2_000).await.unwrap();
        assert_ne!(first, second);

        let answer = feed.lookup(&topic, &owner.address(), 2_500).await.unwrap();
        assert_eq!(answer.data, b"v2");
        assert_eq!(answer.epoch, second);
        assert_eq!(answer.time, 2_000);

        let answer = feed.lookup(&topic, &owner.address(), 1_500).await.unwrap();
        assert_eq!(answer.data, b"v1");
    }

    #[tokio::test]
    async fn test_feeds_are_per_owner() {
        let (feed, alice) = setup();
        let bob = SecretKey::generate().unwrap();
        let topic = Topic::new("/shared-name");

        feed.update(&topic, &alice, b"alice", 1_000).await.unwrap();
        assert!(feed
            .try_lookup(&topic, &bob.address(), 2_000)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_epoch_collision() {
        let (feed, owner) = setup();
        let topic = Topic::new("/same-ms");

        let epoch = feed.update(&topic, &owner, b"a", 0).await.unwrap();
        let previous = feed.lookup(&topic, &owner.address(), 0).await.unwrap();
        assert_eq!(previous.epoch, epoch);

        // a level-41 window can hold one more write at the same instant ...
        let epoch = feed
            .write_next(&topic, &owner, Some(&previous), b"b", 0)
            .await
            .unwrap();
        assert_eq!(epoch.level(), HIGHEST_LEVEL - 1);

        // ... but a level-0 epoch cannot
        let level_zero = LookupAnswer {
            data: vec![],
            epoch: Epoch::new(0, 5),
            time: 5,
        };
        assert!(matches!(
            feed.write_next(&topic, &owner, Some(&level_zero), b"c", 5).await,
            Err(FeedError::EpochCollision(_))
        ));
    }

    #[tokio::test]
    async fn test_replayed_update_succeeds() {
        let (feed, owner) = setup();
        let topic = Topic::new("/replay");

        feed.update(&topic, &owner, b"v1", 1_000).await.unwrap();
        let previous = feed.lookup(&topic, &owner.address(), 1_000).await.unwrap();
        let written = feed
            .write_next(&topic, &owner, Some(&previous), b"v2", 1_001)
            .await
            .unwrap();
        let replayed = feed
            .write_next(&topic, &owner, Some(&previous), b"v2", 1_001)
            .await
            .unwrap();
        assert_eq!(written, replayed);

        let answer = feed.lookup(&topic, &owner.address(), 2_000).await.unwrap();
        assert_eq!(answer.data, b"v2");
    }

    #[tokio::test]
    async fn test_concurrent_writers_conflict() {
        let (feed, owner) = setup();
        let topic = Topic::new("/two-sessions");

        feed.update(&topic, &owner, b"base", 1_000).await.unwrap();
        let previous = feed.lookup(&topic, &owner.address(), 1_000).await.unwrap();

        let epoch = feed
            .write_next(&topic, &owner, Some(&previous), b"session A", 1_001)
            .await
            .unwrap();
        match feed
            .write_next(&topic, &owner, Some(&previous), b"session B", 1_002)
            .await
        {
            Err(FeedError::Conflict(taken)) => assert_eq!(taken, epoch),
            other => panic!("expected a conflict, got {:?}", other),
        }

        let answer = feed.lookup(&topic, &owner.address(), 2_000).await.unwrap();
        assert_eq!(answer.data, b"session A");
    }
}
