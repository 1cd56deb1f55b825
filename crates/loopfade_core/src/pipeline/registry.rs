//! Live process registry and termination requests.
//!
//! Every external process a conversion starts is registered here so a
//! batch-wide interrupt can reach it. Each process receives at most one
//! termination request no matter how many parties ask; the first cause
//! recorded wins.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Notify;

use crate::errors::{ConversionError, ConversionResult, Stage};
use crate::tools::StageCommand;

const LIVE: u8 = 0;
const REQUESTED_BY_PIPELINE: u8 = 1;
const REQUESTED_BY_INTERRUPT: u8 = 2;

/// Who asked a process to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// The other side of the pipeline finished or failed.
    Pipeline,
    /// The whole batch was interrupted.
    Interrupt,
}

impl TerminationCause {
    fn as_state(self) -> u8 {
        match self {
            TerminationCause::Pipeline => REQUESTED_BY_PIPELINE,
            TerminationCause::Interrupt => REQUESTED_BY_INTERRUPT,
        }
    }

    fn from_state(state: u8) -> Option<Self> {
        match state {
            REQUESTED_BY_PIPELINE => Some(TerminationCause::Pipeline),
            REQUESTED_BY_INTERRUPT => Some(TerminationCause::Interrupt),
            _ => None,
        }
    }
}

/// How a registered process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageExit {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    /// Termination request the process received, if any.
    pub cause: Option<TerminationCause>,
}

impl StageExit {
    /// Exited on its own with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Shared view of one live process.
#[derive(Debug)]
pub struct ProcessHandle {
    id: u64,
    stage: Stage,
    state: AtomicU8,
    requested: Notify,
}

impl ProcessHandle {
    fn new(id: u64, stage: Stage) -> Self {
        Self {
            id,
            stage,
            state: AtomicU8::new(LIVE),
            requested: Notify::new(),
        }
    }

    /// Registry identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Pipeline stage this process runs.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Ask the process to terminate.
    ///
    /// Returns false when a request was already made; the earlier cause
    /// is kept and no second signal is sent.
    pub fn request_termination(&self, cause: TerminationCause) -> bool {
        let first = self
            .state
            .compare_exchange(LIVE, cause.as_state(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if first {
            self.requested.notify_one();
        }
        first
    }

    /// The cause of the termination request, if one was made.
    pub fn termination_cause(&self) -> Option<TerminationCause> {
        TerminationCause::from_state(self.state.load(Ordering::SeqCst))
    }

    async fn wait_for_request(&self) -> TerminationCause {
        loop {
            if let Some(cause) = self.termination_cause() {
                return cause;
            }
            self.requested.notified().await;
        }
    }
}

/// Registry of every live child process in a batch.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    live: Mutex<HashMap<u64, Arc<ProcessHandle>>>,
    interrupted: AtomicBool,
    next_id: AtomicU64,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`interrupt_all`](Self::interrupt_all) has been called.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Number of processes currently registered.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Request termination of every live process, and of any process
    /// registered afterwards.
    pub fn interrupt_all(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        let live = self.live.lock();
        tracing::warn!("Interrupt received, stopping {} process(es)", live.len());
        for handle in live.values() {
            handle.request_termination(TerminationCause::Interrupt);
        }
    }

    /// Spawn a stage command and register it.
    ///
    /// `configure` sets up standard streams before the spawn. Refuses
    /// to start anything once the registry has been interrupted.
    pub fn spawn(
        self: &Arc<Self>,
        command: &StageCommand,
        configure: impl FnOnce(&mut Command),
    ) -> ConversionResult<TrackedChild> {
        if self.is_interrupted() {
            return Err(ConversionError::Interrupted);
        }

        let mut cmd = command.to_command();
        cmd.stdin(Stdio::null());
        configure(&mut cmd);

        tracing::debug!("[{}] $ {}", command.stage, command.display());
        let child = cmd
            .spawn()
            .map_err(|e| ConversionError::spawn_failed(command.stage, &command.program, e))?;

        let handle = self.register(command.stage);
        Ok(TrackedChild {
            child,
            handle,
            registry: Arc::clone(self),
            signalled: false,
        })
    }

    fn register(&self, stage: Stage) -> Arc<ProcessHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = Arc::new(ProcessHandle::new(id, stage));

        let mut live = self.live.lock();
        live.insert(id, Arc::clone(&handle));
        if self.is_interrupted() {
            handle.request_termination(TerminationCause::Interrupt);
        }
        handle
    }

    fn deregister(&self, id: u64) {
        self.live.lock().remove(&id);
    }
}

/// A spawned child that stays registered until dropped.
#[derive(Debug)]
pub struct TrackedChild {
    child: Child,
    handle: Arc<ProcessHandle>,
    registry: Arc<ProcessRegistry>,
    signalled: bool,
}

impl TrackedChild {
    /// Shared handle for requesting termination from elsewhere.
    pub fn handle(&self) -> Arc<ProcessHandle> {
        Arc::clone(&self.handle)
    }

    /// Take the piped stdout, if any.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the piped stdin, if any.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Wait for the process to exit.
    ///
    /// A termination request that arrives while waiting is delivered as
    /// a signal exactly once, and waiting continues until the process
    /// is gone.
    pub async fn wait(&mut self) -> ConversionResult<StageExit> {
        loop {
            let cause = tokio::select! {
                status = self.child.wait() => {
                    let status = status.map_err(|e| {
                        ConversionError::io(format!("wait for {}", self.handle.stage), "child process", e)
                    })?;
                    return Ok(StageExit {
                        code: status.code(),
                        cause: self.handle.termination_cause(),
                    });
                }
                cause = self.handle.wait_for_request(), if !self.signalled => cause,
            };

            self.signalled = true;
            tracing::debug!("[{}] terminating ({:?})", self.handle.stage, cause);
            self.deliver_signal();
        }
    }

    #[cfg(unix)]
    fn deliver_signal(&mut self) {
        // Already reaped when there is no pid.
        if let Some(pid) = self.child.id() {
            // SAFETY: pid belongs to a child we have not yet reaped.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                tracing::debug!(
                    "[{}] SIGTERM failed: {}",
                    self.handle.stage,
                    std::io::Error::last_os_error()
                );
            }
        }
    }

    #[cfg(not(unix))]
    fn deliver_signal(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!("[{}] kill failed: {}", self.handle.stage, e);
        }
    }
}

impl Drop for TrackedChild {
    fn drop(&mut self) {
        self.registry.deregister(self.handle.id);
    }
}
