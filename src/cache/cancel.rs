//! Cancellation Helpers
//!
//! The client never imposes its own timeouts. Callers that want a deadline
//! derive a token that fires on its own after a delay.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

// == Deadline Token ==
/// Returns a child of `parent` that is cancelled after `timeout`.
///
/// The child also fires when `parent` is cancelled. Must be called from
/// within a Tokio runtime.
pub fn deadline_token(parent: &CancellationToken, timeout: Duration) -> CancellationToken {
    let child = parent.child_token();
    let timer = child.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => timer.cancel(),
            _ = timer.cancelled() => {}
        }
    });

    child
}
