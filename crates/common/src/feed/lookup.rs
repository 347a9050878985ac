//! Latest-version search over an epoch chain.
//!
//! Starting from a hint (or from nothing), probe the epoch the next write
//! after the hint would have used. A hit becomes the new hint and the search
//! descends inside its window; a miss means either the hint was the latest
//! version, or nothing was written in this window and the search steps back
//! to the window just before it. Each probe either narrows the window or
//! moves strictly backwards in time, so the number of probes is bounded by
//! the number of levels for a well-formed chain.

use std::future::Future;

use super::epoch::{Epoch, LOWEST_LEVEL};

/// A hint coarser than any real epoch: its successor is always a
///  top-level epoch and its window covers all of time.
fn worst_hint() -> Epoch {
    Epoch::new(63, 0)
}

/// Find the latest epoch at or before `now` for which `read` yields a value.
///
/// `read` must return `Ok(None)` for epochs with no value visible at `now`.
pub async fn find_latest<T, E, F, Fut>(
    now: u64,
    hint: Option<Epoch>,
    mut read: F,
) -> Result<Option<(Epoch, T)>, E>
where
    F: FnMut(Epoch) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let worst = worst_hint();
    let mut hint = hint.unwrap_or(worst);
    let mut last_found: Option<(Epoch, T)> = None;
    let mut t = now;

    loop {
        let epoch = hint.next(t);
        if let Some(value) = read(epoch).await? {
            if epoch.level() == LOWEST_LEVEL || epoch == hint {
                return Ok(Some((epoch, value)));
            }
            last_found = Some((epoch, value));
            hint = epoch;
            continue;
        }

        if epoch.base() == hint.base() {
            if last_found.is_some() {
                return Ok(last_found);
            }
            if hint == worst {
                return Ok(None);
            }
            // a caller-supplied hint: check it directly
            if let Some(value) = read(hint).await? {
                return Ok(Some((hint, value)));
            }
            t = hint.base();
            hint = worst;
            continue;
        }

        let base = epoch.base();
        if base == 0 {
            return Ok(last_found);
        }
        t = base - 1;
    }
}
