//! Worker pool supervision
//!
//! A long-lived control loop that reaps finished workers and keeps the
//! pool's signals honest. Workers announce their own completion on a
//! channel, so the loop wakes on events instead of polling the pool at a
//! fixed interval.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::{SharedRunState, WorkerId};

/// Sender half handed to every spawned worker; the worker sends its id
/// exactly once, when its unit of work is done.
pub type CompletionSender = mpsc::UnboundedSender<WorkerId>;

/// Create the completion channel connecting workers to the supervisor.
pub fn completion_channel() -> (CompletionSender, mpsc::UnboundedReceiver<WorkerId>) {
    mpsc::unbounded_channel()
}

/// Run the supervision loop until a stop has been requested and the pool
/// has drained.
pub async fn supervise(
    state: Arc<SharedRunState>,
    mut completions: mpsc::UnboundedReceiver<WorkerId>,
) {
    let mut stop = state.stop.subscribe();

    loop {
        if state.stop.is_set() && state.live_count() == 0 {
            debug!("supervisor stopping, pool drained");
            return;
        }

        tokio::select! {
            finished = completions.recv() => match finished {
                Some(id) => {
                    trace!(worker = id, "reaped worker");
                    state.reap_worker(id);
                }
                None => {
                    // Channel closed with workers still registered: they
                    // vanished without reporting. Count them as reaped.
                    for id in state.live_worker_ids() {
                        warn!(worker = id, "worker disappeared without completing");
                        state.reap_worker(id);
                    }
                    state.stop.wait().await;
                    debug!("supervisor stopping, completion channel closed");
                    return;
                }
            },
            _ = stop.changed() => {}
        }
    }
}
