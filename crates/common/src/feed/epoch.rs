use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarsest epoch level. A level-41 window spans 2^41 ms, about 69 years.
pub const HIGHEST_LEVEL: u8 = 41;
/// Finest epoch level: a single millisecond.
pub const LOWEST_LEVEL: u8 = 0;

/// A version slot in a topic's version chain.
///
/// `time` is always aligned to `2^level`: an epoch names the window
/// `[time, time + 2^level)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Epoch {
    level: u8,
    time: u64,
}

/// Align `at` to the start of its `2^level` window
pub fn base_time(at: u64, level: u8) -> u64 {
    if level >= 64 {
        return 0;
    }
    at & (u64::MAX << level)
}

impl Epoch {
    pub fn new(level: u8, at: u64) -> Self {
        Self {
            level,
            time: base_time(at, level),
        }
    }

    /// Epoch of the first write to a topic made at `at`
    pub fn first(at: u64) -> Self {
        Self::new(HIGHEST_LEVEL, at)
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Start of this epoch's window
    pub fn base(&self) -> u64 {
        self.time
    }

    /// The level the write after this one should use when made at `at`.
    ///
    /// Writes inside this epoch's window descend exactly one level; writes
    /// further away jump to the highest level at which `at` leaves the
    /// window. Writes more than `2^HIGHEST_LEVEL` ms away start over at
    /// the top.
    pub fn next_level(&self, at: u64) -> u8 {
        let mut mix = self.time ^ at;
        if self.level > 0 && self.level <= 64 {
            mix |= 1u64 << (self.level - 1);
        }
        if mix > u64::MAX >> (64 - HIGHEST_LEVEL as u32 - 1) {
            return HIGHEST_LEVEL;
        }

        let mut mask = 1u64 << HIGHEST_LEVEL;
        for level in (LOWEST_LEVEL + 1..=HIGHEST_LEVEL).rev() {
            if mix & mask != 0 {
                return level;
            }
            mask >>= 1;
        }
        LOWEST_LEVEL
    }

    /// The epoch the write after this one should use when made at `at`
    pub fn next(&self, at: u64) -> Self {
        Self::new(self.next_level(at), at)
    }

    /// Whether `at` falls inside this epoch's window
    pub fn contains(&self, at: u64) -> bool {
        base_time(at, self.level) == self.time
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.time, self.level)
    }
}
