//! Error types for command execution

use crate::category::ErrorCategory;
use crate::relay::LogSource;
use thiserror::Error;

/// Unified error type for running commands
#[derive(Error, Debug)]
pub enum Error {
    /// The process could not be started at all
    #[error("failed to start command {command}: {reason}")]
    SpawnFailed {
        /// The program that failed to start
        command: String,
        /// The reason for the spawn failure
        reason: String,
    },

    /// The process ran and exited with a non-zero code
    #[error("command {command} exited with code {code}")]
    ExitFailure {
        /// The program that failed
        command: String,
        /// The exit code reported by the process
        code: i32,
        /// Category recognised in this run's output
        category: ErrorCategory,
    },

    /// Process terminated by signal
    #[error("command {command} terminated by signal {signal}")]
    SignalTerminated {
        /// The program that was terminated
        command: String,
        /// The signal number that terminated the process
        signal: i32,
        /// Category recognised in this run's output before it was stopped
        category: ErrorCategory,
    },

    /// Copying one of the output streams failed part way
    #[error("failed to relay {stream} of command {command}: {reason}")]
    RelayFailed {
        /// The program whose output was being relayed
        command: String,
        /// Which stream failed
        stream: LogSource,
        /// The reason for the relay failure
        reason: String,
    },

    /// Configuration could not be read or parsed
    #[error("invalid configuration: {reason}")]
    Config {
        /// The reason the configuration was rejected
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a spawn failed error
    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// The exit code carried by this error, if the process got far enough to report one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ExitFailure { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The category recognised in the output of a process that ran and failed
    pub fn category(&self) -> Option<&ErrorCategory> {
        match self {
            Error::ExitFailure { category, .. } | Error::SignalTerminated { category, .. } => {
                Some(category)
            }
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
