//! Bounded condition waits
//!
//! The portal gives no "population complete" signal, so every suspension point
//! polls a readiness check until it holds or the timeout elapses.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::AppResult;

/// Poll `check` every `poll` until it yields `Some` or `timeout` elapses.
///
/// The check runs at least once. Check errors abort the wait. `Ok(None)` means the
/// timeout elapsed; callers map that to their own error.
pub async fn wait_until<T, F, Fut>(
    label: &str,
    timeout: Duration,
    poll: Duration,
    mut check: F,
) -> AppResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    let mut polls = 0u32;

    loop {
        polls += 1;
        if let Some(value) = check().await? {
            debug!("{} ready after {} poll(s)", label, polls);
            return Ok(Some(value));
        }

        if Instant::now() >= deadline {
            debug!("{} not ready after {:?} ({} polls)", label, timeout, polls);
            return Ok(None);
        }

        sleep(poll).await;
    }
}
