//! Drives one execution from Pending to a terminal state.
//!
//! Each submitted command gets its own runner task. The runner is the only
//! component that spawns the child process, and it finalizes the record
//! through the registry so a concurrent kill can never be overwritten.

use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{info, warn};

use crate::registry::{CancelHandle, ExecState};
use crate::state::AppState;

/// Run the child process for `id` under the configured deadline and
/// finalize the record. Spawned as an independent task at submit time.
pub async fn run_execution(state: AppState, id: String) {
    // Pending -> Running happens before the child exists, so a kill
    // arriving now observes Running with nothing to signal yet.
    let invocation = state
        .registry
        .with_live(&id, |exec| {
            exec.record.state = ExecState::Running;
            (exec.record.command.clone(), exec.record.args.clone())
        })
        .await;

    let Some((command, args)) = invocation else {
        warn!("execution {} vanished before it could start", id);
        return;
    };

    info!("running {} as {}", command, id);

    let mut child = match Command::new(&command)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("spawning {} for {} failed: {}", command, id, e);
            let output = format!("failed to start {}: {}", command, e);
            finalize(&state, &id, ExecState::Completed, output, Some(-1)).await;
            return;
        }
    };

    // Install the cancellation handle, unless a kill already won the race
    // and the record is no longer Running.
    if let Some(pid) = child.id() {
        state
            .registry
            .with_live(&id, |exec| {
                if exec.record.state == ExecState::Running {
                    exec.cancel = Some(CancelHandle::new(pid));
                }
            })
            .await;
    }

    // Drain both streams concurrently so the child can't block on a full
    // pipe while we wait on it.
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_task = tokio::spawn(read_all(stdout));
    let stderr_task = tokio::spawn(read_all(stderr));

    let deadline = Duration::from_secs(state.config.timeout);
    let mut timed_out = false;
    let status = tokio::select! {
        status = child.wait() => status,
        _ = tokio::time::sleep(deadline) => {
            warn!("execution {} exceeded {:?}, killing", id, deadline);
            timed_out = true;
            let _ = child.start_kill();
            child.wait().await
        }
    };

    let exit_code = match status {
        Ok(status) => status.code().unwrap_or(-1),
        Err(ref e) => {
            warn!("waiting on {} failed: {}", id, e);
            -1
        }
    };

    let mut combined = stdout_task.await.unwrap_or_default();
    combined.extend(stderr_task.await.unwrap_or_default());
    let output = String::from_utf8_lossy(&combined).into_owned();

    let terminal = if timed_out {
        ExecState::TimedOut
    } else {
        ExecState::Completed
    };
    finalize(&state, &id, terminal, output, Some(exit_code)).await;
}

async fn read_all<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut buf).await;
    }
    buf
}

/// Commit a terminal state, unless a kill already won the race.
///
/// Checking the current state and writing the terminal fields happen under
/// the same registry mutation, so exactly one terminal transition wins and
/// `output`/`exit_code`/`ended_at` become visible together.
async fn finalize(
    state: &AppState,
    id: &str,
    terminal: ExecState,
    output: String,
    exit_code: Option<i32>,
) {
    let committed = state
        .registry
        .with_live(id, |exec| {
            if exec.record.state != ExecState::Running {
                return false;
            }
            exec.record.state = terminal;
            exec.record.output = output;
            exec.record.exit_code = exit_code;
            exec.record.ended_at = Some(Utc::now());
            exec.cancel = None;
            true
        })
        .await;

    match committed {
        Some(true) => info!("execution {} finished as {:?}", id, terminal),
        Some(false) => info!("execution {} was killed before it finished", id),
        None => warn!("execution {} vanished before it could finish", id),
    }
}
