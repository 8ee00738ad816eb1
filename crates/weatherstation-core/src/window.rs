//! Window extraction: the recent tail of a stream.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::to_time_delta;
use crate::error::{Error, Result};
use crate::reading::Reading;
use crate::store::StreamStore;

/// Readings of `store` whose timestamp lies within the last `interval` of
/// `now` (cutoff inclusive), oldest first.
///
/// Fails with [`Error::EmptyWindow`] when nothing qualifies. No staleness or
/// gap checks are made beyond the cutoff.
pub fn extract_window(
    store: &StreamStore,
    interval: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<Reading>> {
    let cutoff = window_start(now, interval);
    let window = store.tail_from(cutoff);
    if window.is_empty() {
        return Err(Error::EmptyWindow {
            kind: store.kind(),
            interval,
        });
    }
    Ok(window)
}

/// `now - interval`, clamped to the earliest representable instant.
pub fn window_start(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(to_time_delta(interval))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
