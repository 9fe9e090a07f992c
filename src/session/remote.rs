//! Remote command session
//!
//! Wraps one platform CLI process that runs a command on a workload through
//! the remote-access channel. Stdout and stderr are drained by background
//! tasks into one capture buffer while the caller drives stdin.

use std::fmt;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};

use crate::common::{Error, Result};
use crate::platform::Platform;
use crate::units::MEGABYTE;
use crate::workload::WorkloadIdentity;

/// How long reader tasks may keep draining after the process exits
const READER_GRACE: Duration = Duration::from_secs(5);

/// Captured output kept per session; older bytes are dropped first
const OUTPUT_LIMIT: usize = MEGABYTE as usize;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Spawned,
    Running,
    /// Stdin closed, waiting for the remote side to finish reading
    Draining,
    Terminated {
        exit_code: Option<i32>,
    },
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => write!(f, "created"),
            SessionState::Spawned => write!(f, "spawned"),
            SessionState::Running => write!(f, "running"),
            SessionState::Draining => write!(f, "draining"),
            SessionState::Terminated { exit_code: Some(code) } => {
                write!(f, "terminated (exit code {})", code)
            }
            SessionState::Terminated { exit_code: None } => write!(f, "terminated (signal)"),
        }
    }
}

/// Whether the caller will write to the remote command's stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdinMode {
    Closed,
    Piped,
}

/// Exit status and captured output of a finished session
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub exit_code: Option<i32>,
    /// Stdout and stderr interleaved in arrival order
    pub output: String,
}

impl SessionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// One remote command process
pub struct CommandSession {
    platform: Platform,
    workload: String,
    command: String,
    state: SessionState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    output: Arc<Mutex<Vec<u8>>>,
    readers: Vec<JoinHandle<()>>,
}

impl CommandSession {
    pub fn new(platform: &Platform, workload: &WorkloadIdentity, command: impl Into<String>) -> Self {
        Self {
            platform: platform.clone(),
            workload: workload.name().to_string(),
            command: command.into(),
            state: SessionState::Created,
            child: None,
            stdin: None,
            output: Arc::new(Mutex::new(Vec::new())),
            readers: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Start the platform CLI and begin draining its output
    pub fn spawn(&mut self, stdin: StdinMode) -> Result<()> {
        if self.state != SessionState::Created {
            return Err(Error::invalid_state("spawn", self.state));
        }

        let mut cmd = self
            .platform
            .command(Platform::ssh_args(&self.workload, &self.command));
        if stdin == StdinMode::Piped {
            cmd.stdin(Stdio::piped());
        }

        tracing::debug!(workload = %self.workload, command = %self.command, "Opening remote session");
        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: self.platform.program().display().to_string(),
            source,
        })?;
        self.state = SessionState::Spawned;

        self.stdin = child.stdin.take();
        if let Some(stdout) = child.stdout.take() {
            self.readers
                .push(spawn_reader(stdout, "stdout", self.output.clone(), OUTPUT_LIMIT));
        }
        if let Some(stderr) = child.stderr.take() {
            self.readers
                .push(spawn_reader(stderr, "stderr", self.output.clone(), OUTPUT_LIMIT));
        }
        self.child = Some(child);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Writable end of the remote command's stdin
    pub fn stdin(&mut self) -> Result<&mut ChildStdin> {
        if self.state != SessionState::Running {
            return Err(Error::invalid_state("write stdin", self.state));
        }
        self.stdin
            .as_mut()
            .ok_or_else(|| Error::invalid_state("write stdin", "running without piped stdin"))
    }

    /// Signal end-of-input to the remote side
    pub async fn close_stdin(&mut self) -> Result<()> {
        if self.state != SessionState::Running {
            return Err(Error::invalid_state("close stdin", self.state));
        }
        if let Some(mut stdin) = self.stdin.take() {
            // The remote side may already be gone; dropping still closes the pipe
            if let Err(e) = stdin.shutdown().await {
                tracing::debug!(error = %e, "Shutting down stdin failed");
            }
        }
        self.state = SessionState::Draining;
        Ok(())
    }

    /// Wait for the process to exit within `limit`
    pub async fn wait(&mut self, limit: Duration) -> Result<SessionOutcome> {
        self.wait_until(Instant::now() + limit, limit.as_secs()).await
    }

    /// Wait for the process to exit before `deadline`
    ///
    /// `budget_secs` only labels the timeout error.
    pub async fn wait_until(&mut self, deadline: Instant, budget_secs: u64) -> Result<SessionOutcome> {
        if !matches!(self.state, SessionState::Running | SessionState::Draining) {
            return Err(Error::invalid_state("wait", self.state));
        }
        // Stdin left open would keep a stdin-reading command alive forever
        self.stdin.take();

        let child = self
            .child
            .as_mut()
            .ok_or_else(|| Error::Internal("session has no child process".to_string()))?;

        let status = match timeout_at(deadline, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                tracing::warn!(command = %self.command, secs = budget_secs, "Remote command timed out");
                return Err(Error::SessionTimeout {
                    command: self.command.clone(),
                    secs: budget_secs,
                });
            }
        };

        let grace = READER_GRACE.min(deadline.saturating_duration_since(Instant::now()));
        for mut reader in self.readers.drain(..) {
            if timeout(grace, &mut reader).await.is_err() {
                // A grandchild still holds the pipe open; keep what was captured
                reader.abort();
            }
        }

        let exit_code = status.code();
        self.state = SessionState::Terminated { exit_code };
        tracing::debug!(command = %self.command, ?exit_code, "Remote command finished");

        Ok(SessionOutcome {
            exit_code,
            output: self.output(),
        })
    }

    /// Output captured so far
    ///
    /// Holds at least the last megabyte; a command echoing a large payload
    /// does not grow the buffer past twice that.
    pub fn output(&self) -> String {
        let captured = self.output.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&captured).into_owned()
    }
}

impl Drop for CommandSession {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

/// Drain `stream` into `sink`, trimming the front back to `limit` once it
/// grows past twice that
fn spawn_reader<R>(
    mut stream: R,
    name: &'static str,
    sink: Arc<Mutex<Vec<u8>>>,
    limit: usize,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 8192];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    tracing::trace!(stream = name, "{}", String::from_utf8_lossy(&buf[..n]).trim_end());
                    if let Ok(mut captured) = sink.lock() {
                        captured.extend_from_slice(&buf[..n]);
                        if captured.len() > 2 * limit {
                            let excess = captured.len() - limit;
                            captured.drain(..excess);
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(stream = name, error = %e, "Reading session output failed");
                    break;
                }
            }
        }
    })
}

/// Run a command on `workload` with stdin closed and wait for it
pub async fn remote_exec(
    platform: &Platform,
    workload: &WorkloadIdentity,
    command: &str,
    limit: Duration,
) -> Result<SessionOutcome> {
    let mut session = CommandSession::new(platform, workload, command);
    session.spawn(StdinMode::Closed)?;
    session.wait(limit).await
}
