//! Runtime-agnostic command runner with console error classification
//!
//! This crate runs shell scripts and executables, relays their stdout and
//! stderr to caller supplied writers in real time, and classifies failures
//! by matching console lines against configured wildcard patterns.
//!
//! # Example
//!
//! ```rust,no_run
//! use command_runner::{CapturedOutput, ErrorCategoryMapping, Runner};
//!
//! # async fn example() -> command_runner::Result<()> {
//! let stdout = CapturedOutput::new();
//! let mut runner = Runner::new()
//!     .with_stdout(stdout.clone())
//!     .with_env(["GREETING=hello"])
//!     .with_error_categories(
//!         ErrorCategoryMapping::new().with("build", ["BUILD * FAILED"]),
//!     );
//!
//! let outcome = runner.run_executable("/bin/echo", ["$GREETING"]).await?;
//! assert_eq!(stdout.text(), "hello\n");
//! assert!(outcome.category.is_undefined());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod category;
pub mod classifier;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod output;
pub mod pattern;
pub mod process;
pub mod relay;
pub mod runner;
pub mod spawner;

pub use category::{ErrorCategory, ErrorCategoryState};
pub use classifier::{Classifier, ErrorCategoryMapping};
pub use command::Command;
pub use config::RunnerConfig;
pub use env::EnvOverlay;
pub use error::{Error, Result};
pub use output::{CapturedOutput, SharedWriter};
pub use process::{Execution, ExitStatus, RunOutcome};
pub use relay::{LogSource, MAX_CLASSIFIED_LINE_LEN};
pub use runner::Runner;
pub use spawner::{LocalSpawner, Spawner};
