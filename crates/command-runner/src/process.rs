//! Supervision of a spawned child process
//!
//! An [`Execution`] owns a running child together with everything needed to
//! relay its output. Waiting on it drains stdout and stderr concurrently
//! with feeding stdin, joins all three, and only then collects the exit
//! status, so a child blocked on a full pipe can never stall the wait. The
//! first transfer to fail cancels the others.

use crate::category::ErrorCategory;
use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::output::SharedWriter;
use crate::relay::{LogSource, relay};
use crate::spawner::Child;
use async_process::ChildStdin;
use chrono::{DateTime, Duration, Utc};
use futures::io::{AsyncRead, AsyncWriteExt};
use serde::Serialize;
use std::io;
use tracing::{debug, info, warn};

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,
    /// Signal that terminated the process (always `None` off Unix)
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// Returns true if the process exited successfully (code 0)
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Returns true if the process was terminated by a signal
    pub fn terminated_by_signal(&self) -> bool {
        self.signal.is_some()
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            #[cfg(unix)]
            signal: {
                use std::os::unix::process::ExitStatusExt;
                status.signal()
            },
            #[cfg(not(unix))]
            signal: None,
        }
    }
}

/// Result of a run that exited with code 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// How the process exited
    pub status: ExitStatus,
    /// Category recognised in this run's output, independent of other runs
    pub category: ErrorCategory,
    /// When the process was spawned
    pub started_at: DateTime<Utc>,
    /// When the exit status was collected
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Exit code of the process
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code
    }

    /// Wall-clock time between spawn and exit
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }
}

/// A running child process whose output is relayed while it is awaited
pub struct Execution {
    command: String,
    child: Child,
    stdin: Option<Vec<u8>>,
    stdout: SharedWriter,
    stderr: SharedWriter,
    classifier: Option<Classifier>,
    started_at: DateTime<Utc>,
}

impl Execution {
    pub(crate) fn new(
        command: String,
        child: Child,
        stdin: Option<Vec<u8>>,
        stdout: SharedWriter,
        stderr: SharedWriter,
        classifier: Option<Classifier>,
    ) -> Self {
        Self {
            command,
            child,
            stdin,
            stdout,
            stderr,
            classifier,
            started_at: Utc::now(),
        }
    }

    /// Get the process ID
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Name of the program being run
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Forcefully stop the process
    pub fn kill(&mut self) -> Result<()> {
        debug!(command = %self.command, pid = self.pid(), "Killing process");
        self.child.kill()?;
        Ok(())
    }

    /// Relay all output until the process exits and report how it ended.
    ///
    /// A non-zero exit code becomes [`Error::ExitFailure`] and a fatal signal
    /// becomes [`Error::SignalTerminated`]; both carry the category
    /// recognised in this run. If feeding stdin or relaying either stream
    /// fails, the remaining transfers are abandoned and the process is killed.
    pub async fn wait(mut self) -> Result<RunOutcome> {
        let stdin = self.child.stdin.take();
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();
        let input = self.stdin.take();
        let classifier = self.classifier.as_ref();

        let relayed = futures::try_join!(
            feed_stdin(stdin, input),
            drain(&self.command, LogSource::Stdout, stdout, &self.stdout, classifier),
            drain(&self.command, LogSource::Stderr, stderr, &self.stderr, classifier)
        );

        if let Err(e) = relayed {
            warn!(command = %self.command, error = %e, "Output relay failed, killing process");
            if let Err(kill_err) = self.child.kill() {
                debug!(error = %kill_err, "Process already gone");
            }
            self.child.status().await?;
            return Err(e);
        }

        let status = ExitStatus::from(self.child.status().await?);
        let finished_at = Utc::now();
        info!(
            command = %self.command,
            code = ?status.code,
            signal = ?status.signal,
            "Process exited"
        );

        let category = self
            .classifier
            .as_ref()
            .map(Classifier::run_category)
            .unwrap_or_default();

        match (status.code, status.signal) {
            (Some(0), _) => Ok(RunOutcome {
                status,
                category,
                started_at: self.started_at,
                finished_at,
            }),
            (Some(code), _) => Err(Error::ExitFailure {
                command: self.command,
                code,
                category,
            }),
            (None, Some(signal)) => Err(Error::SignalTerminated {
                command: self.command,
                signal,
                category,
            }),
            (None, None) => Err(Error::ExitFailure {
                command: self.command,
                code: -1,
                category,
            }),
        }
    }
}

async fn feed_stdin(stdin: Option<ChildStdin>, input: Option<Vec<u8>>) -> Result<()> {
    let (Some(mut stdin), Some(input)) = (stdin, input) else {
        return Ok(());
    };

    let written: io::Result<()> = async {
        stdin.write_all(&input).await?;
        stdin.close().await
    }
    .await;

    match written {
        Ok(()) => Ok(()),
        // The child exited without consuming all of its input
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Child closed stdin early");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn drain<R>(
    command: &str,
    stream: LogSource,
    pipe: Option<R>,
    writer: &SharedWriter,
    classifier: Option<&Classifier>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(());
    };
    relay(pipe, writer, classifier)
        .await
        .map_err(|e| Error::RelayFailed {
            command: command.to_string(),
            stream,
            reason: e.to_string(),
        })
}
