//! External cancellation of running executions.

use chrono::Utc;
use tracing::{info, warn};

use crate::registry::{ExecState, Registry};

/// Outcome of a kill request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// The process was terminated and the record is now Killed.
    Killed,
    /// The record already reached a terminal state, or the child has not
    /// been spawned yet. Idempotent success.
    AlreadyTerminal,
    /// No record with that id.
    NotFound,
    /// The OS refused the signal (the process likely exited concurrently).
    Failed,
}

/// Force-terminate the execution `id`.
///
/// The state check and the signal both happen inside one registry mutation,
/// so a kill can never overwrite a Completed record and a natural exit can
/// never overwrite a Killed one: whichever commits first wins, and the
/// loser performs no side effect.
pub async fn kill_execution(registry: &Registry, id: &str) -> KillOutcome {
    let outcome = registry
        .with_live(id, |exec| {
            if exec.record.state.is_terminal() {
                return KillOutcome::AlreadyTerminal;
            }
            // Pending, or Running with no pid installed yet: nothing to kill.
            let Some(handle) = exec.cancel else {
                return KillOutcome::AlreadyTerminal;
            };
            match handle.terminate() {
                Ok(()) => {
                    exec.record.state = ExecState::Killed;
                    exec.record.ended_at = Some(Utc::now());
                    exec.cancel = None;
                    KillOutcome::Killed
                }
                Err(e) => {
                    warn!("terminating {} failed: {}", id, e);
                    KillOutcome::Failed
                }
            }
        })
        .await;

    match outcome {
        Some(outcome) => {
            if outcome == KillOutcome::Killed {
                info!("killed execution {}", id);
            }
            outcome
        }
        None => KillOutcome::NotFound,
    }
}
