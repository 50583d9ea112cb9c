//! Execution records and the concurrent registry that owns them.
//!
//! The registry is the single shared mutable resource in the process: HTTP
//! handlers, runner tasks and the sweeper all go through it. Readers get
//! clone-out snapshots and every mutation runs inside [`Registry::with_live`],
//! so no partially updated record is ever observable.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Lifecycle state of one execution.
///
/// Transitions are one-way: `Pending` -> `Running` -> one of the terminal
/// states. Nothing leaves a terminal state except eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecState {
    Pending,
    Running,
    Completed,
    TimedOut,
    Killed,
}

impl ExecState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecState::Completed | ExecState::TimedOut | ExecState::Killed
        )
    }
}

/// Snapshot of one command invocation, as returned by status queries.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub command: String,
    pub args: Vec<String>,
    pub state: ExecState,
    /// Combined stdout/stderr; empty until the record turns terminal.
    pub output: String,
    /// Exit status, set together with `output` at Completed/TimedOut.
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Handle for force-terminating a running child.
///
/// Kept next to the record, never serialized into status responses.
#[derive(Debug, Clone, Copy)]
pub struct CancelHandle {
    pid: u32,
}

impl CancelHandle {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }

    /// Deliver SIGKILL to the child. Fails if the process is already gone.
    pub fn terminate(self) -> Result<(), String> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        kill(Pid::from_raw(self.pid as i32), Signal::SIGKILL)
            .map_err(|e| format!("kill pid {}: {}", self.pid, e))
    }
}

/// Live registry entry: the externally visible record plus its private
/// cancellation companion.
#[derive(Debug)]
pub struct Execution {
    pub record: ExecutionRecord,
    pub cancel: Option<CancelHandle>,
}

/// Concurrency-safe store of executions, keyed by id.
///
/// The registry is the only component that inserts or removes entries.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Execution>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a fresh Pending record and return its id.
    pub async fn create(&self, command: String, args: Vec<String>) -> String {
        let id = Uuid::new_v4().to_string();
        let record = ExecutionRecord {
            id: id.clone(),
            command,
            args,
            state: ExecState::Pending,
            output: String::new(),
            exit_code: None,
            started_at: Utc::now(),
            ended_at: None,
        };
        let execution = Execution {
            record,
            cancel: None,
        };
        self.entries.write().await.insert(id.clone(), execution);
        id
    }

    /// Snapshot of the record, or `None` if the id is unknown or evicted.
    pub async fn get(&self, id: &str) -> Option<ExecutionRecord> {
        self.entries.read().await.get(id).map(|e| e.record.clone())
    }

    /// Run `f` against the live entry under the write lock.
    ///
    /// All mutation funnels through here. `f` is synchronous, so no
    /// reference to the entry can outlive the lock or cross an await point.
    pub async fn with_live<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Execution) -> R,
    ) -> Option<R> {
        let mut entries = self.entries.write().await;
        entries.get_mut(id).map(f)
    }

    /// Remove every terminal record that ended before `cutoff`, returning
    /// the evicted ids. Non-terminal records are never removed, whatever
    /// their age.
    pub async fn sweep_terminal(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        let mut entries = self.entries.write().await;

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| {
                e.record.state.is_terminal()
                    && e.record.ended_at.is_some_and(|ended| ended < cutoff)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            entries.remove(id);
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
