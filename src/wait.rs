//! Waiting for a service to finish a pending transition.
//!
//! After a start or stop request the service sits in a pending state and reports progress
//! through [`ServiceStatus::checkpoint`] and an estimate of the remaining time through
//! [`ServiceStatus::wait_hint`]. [`await_transition`] polls the status until the pending state is
//! left, giving up once the checkpoint has not advanced for longer than the wait hint.

use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::service::{ServiceState, ServiceStatus};
use crate::Result;

/// Shortest pause between two status polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1_000);
/// Longest pause between two status polls.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

/// Anything whose current status can be read.
pub trait StatusSource {
    fn query_status(&self) -> Result<ServiceStatus>;
}

/// One tenth of the wait hint, clamped to [`MIN_POLL_INTERVAL`]..=[`MAX_POLL_INTERVAL`].
pub fn poll_interval(wait_hint: Duration) -> Duration {
    (wait_hint / 10).clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}

/// Poll `service` while it reports `pending_state`.
///
/// Returns `true` only if the last status read is exactly `target_state`. Leaving the pending
/// state for any other state, a failed status query and a stalled checkpoint all yield `false`.
pub fn await_transition<S, C>(
    service: &S,
    clock: &C,
    pending_state: ServiceState,
    target_state: ServiceState,
) -> bool
where
    S: StatusSource + ?Sized,
    C: Clock + ?Sized,
{
    let mut status = match service.query_status() {
        Ok(status) => status,
        Err(e) => {
            warn!("Error reading initial service status: {e}");
            return false;
        }
    };
    if status.current_state == target_state {
        return true;
    }

    let mut progress_at = clock.now();
    let mut last_checkpoint = status.checkpoint;

    while status.current_state == pending_state {
        let interval = poll_interval(status.wait_hint);
        debug!(
            state = %status.current_state,
            checkpoint = status.checkpoint,
            wait_hint_ms = status.wait_hint.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
            "Waiting for service to leave pending state"
        );
        clock.sleep(interval);

        status = match service.query_status() {
            Ok(next) => next,
            Err(e) => {
                warn!("Error polling service status: {e}");
                break;
            }
        };

        if status.checkpoint > last_checkpoint {
            progress_at = clock.now();
            last_checkpoint = status.checkpoint;
        } else if clock.now().saturating_sub(progress_at) > status.wait_hint {
            if status.current_state == pending_state {
                warn!(
                    state = %status.current_state,
                    checkpoint = status.checkpoint,
                    "Service made no progress within its wait hint"
                );
            }
            break;
        }
    }

    status.current_state == target_state
}
