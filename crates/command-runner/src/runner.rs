//! Running shell scripts and executables with console classification

use crate::category::ErrorCategoryState;
use crate::classifier::{Classifier, ErrorCategoryMapping};
use crate::command::Command;
use crate::env::EnvOverlay;
use crate::error::{Error, Result};
use crate::output::{SharedWriter, shared_writer, stderr_writer, stdout_writer};
use crate::process::{Execution, RunOutcome};
use crate::spawner::{LocalSpawner, Spawner};
use futures::io::AsyncWrite;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Runs external processes, relaying their output and classifying failures.
///
/// Settings such as writers, environment and the last exit code persist
/// across runs on the same instance. Every run takes `&mut self`, so one
/// runner never executes two commands at once.
pub struct Runner {
    stdout: Option<SharedWriter>,
    stderr: Option<SharedWriter>,
    error_categories: ErrorCategoryMapping,
    category_state: ErrorCategoryState,
    env: EnvOverlay,
    dir: Option<PathBuf>,
    stdin: Option<Vec<u8>>,
    spawner: Arc<dyn Spawner>,
    exit_code: Option<i32>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Create a runner writing to this process's stdout and stderr
    pub fn new() -> Self {
        Self {
            stdout: None,
            stderr: None,
            error_categories: ErrorCategoryMapping::new(),
            category_state: ErrorCategoryState::new(),
            env: EnvOverlay::new(),
            dir: None,
            stdin: None,
            spawner: Arc::new(LocalSpawner),
            exit_code: None,
        }
    }

    /// Relay the child's stdout to `writer`
    pub fn with_stdout<W>(mut self, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        self.set_stdout(writer);
        self
    }

    /// Relay the child's stderr to `writer`
    pub fn with_stderr<W>(mut self, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        self.set_stderr(writer);
        self
    }

    /// Classify console lines with `mapping`
    pub fn with_error_categories(mut self, mapping: ErrorCategoryMapping) -> Self {
        self.error_categories = mapping;
        self
    }

    /// Report recognised categories into `state` as well as into each outcome
    pub fn with_category_state(mut self, state: ErrorCategoryState) -> Self {
        self.category_state = state;
        self
    }

    /// Spawn processes through `spawner` instead of the local OS
    pub fn with_spawner<S>(mut self, spawner: S) -> Self
    where
        S: Spawner + 'static,
    {
        self.spawner = Arc::new(spawner);
        self
    }

    /// Builder form of [`set_env`](Self::set_env)
    pub fn with_env<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_env(entries);
        self
    }

    /// Builder form of [`set_dir`](Self::set_dir)
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.set_dir(dir);
        self
    }

    /// Relay the child's stdout to `writer`
    pub fn set_stdout<W>(&mut self, writer: W)
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        self.stdout = Some(shared_writer(writer));
    }

    /// Relay the child's stderr to `writer`
    pub fn set_stderr<W>(&mut self, writer: W)
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        self.stderr = Some(shared_writer(writer));
    }

    /// Replace the category mapping
    pub fn set_error_categories(&mut self, mapping: ErrorCategoryMapping) {
        self.error_categories = mapping;
    }

    /// The configured category mapping
    pub fn error_categories(&self) -> &ErrorCategoryMapping {
        &self.error_categories
    }

    /// The state recognised categories are reported into
    pub fn category_state(&self) -> &ErrorCategoryState {
        &self.category_state
    }

    /// Replace the environment overlay with `KEY=VALUE` entries.
    ///
    /// A non-empty overlay replaces the inherited environment of the child;
    /// use [`inherit_env`](Self::inherit_env) first to keep it.
    pub fn set_env<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.set(entries);
    }

    /// Append `KEY=VALUE` entries to the environment overlay
    pub fn append_env<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.append(entries);
    }

    /// Seed the overlay with this process's environment, dropping earlier entries
    pub fn inherit_env(&mut self) {
        self.env = EnvOverlay::inherited();
    }

    /// The environment overlay
    pub fn env(&self) -> &EnvOverlay {
        &self.env
    }

    /// Run commands in `dir`
    pub fn set_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dir = Some(dir.into());
    }

    /// Working directory for commands, if one is set
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Deliver `input` on the stdin of executables started by this runner
    pub fn set_stdin(&mut self, input: impl Into<Vec<u8>>) {
        self.stdin = Some(input.into());
    }

    /// Exit code of the last run.
    ///
    /// `None` before the first run, when the last process could not be
    /// started, or when it was terminated by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Run `script` by feeding it to `shell` on stdin
    pub async fn run_shell(
        &mut self,
        shell: impl AsRef<str>,
        script: impl AsRef<str>,
    ) -> Result<RunOutcome> {
        let mut command = self.base_command(shell.as_ref());
        command.stdin_bytes(script.as_ref());
        self.run(command).await
    }

    /// Run executable `name` with `args`.
    ///
    /// `$NAME` and `${NAME}` references in the arguments are replaced with
    /// values from the environment overlay before spawning.
    pub async fn run_executable<I, S>(
        &mut self,
        name: impl AsRef<str>,
        args: I,
    ) -> Result<RunOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let command = self.executable_command(name.as_ref(), args);
        self.run(command).await
    }

    /// Start executable `name` and return without waiting for it.
    ///
    /// Output is relayed while [`Execution::wait`] is awaited; the runner's
    /// exit code is not updated by background executions.
    pub fn run_executable_in_background<I, S>(
        &self,
        name: impl AsRef<str>,
        args: I,
    ) -> Result<Execution>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let command = self.executable_command(name.as_ref(), args);
        self.start(command)
    }

    async fn run(&mut self, command: Command) -> Result<RunOutcome> {
        let result = match self.start(command) {
            Ok(execution) => execution.wait().await,
            Err(e) => Err(e),
        };

        self.exit_code = match &result {
            Ok(outcome) => outcome.exit_code(),
            Err(e) => e.exit_code(),
        };
        result
    }

    fn base_command(&self, program: &str) -> Command {
        let mut command = Command::new(program);
        if !self.env.is_empty() {
            command.env_clear().envs(self.env.pairs());
        }
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }
        command
    }

    fn executable_command<I, S>(&self, name: &str, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut command = self.base_command(name);
        command.args(args.into_iter().map(|arg| self.env.interpolate(arg.as_ref())));
        if let Some(input) = &self.stdin {
            command.stdin_bytes(input.clone());
        }
        command
    }

    fn start(&self, mut command: Command) -> Result<Execution> {
        let label = command.to_string();
        let child = self
            .spawner
            .spawn(&command)
            .map_err(|e| Error::spawn_failed(&label, e.to_string()))?;

        debug!(
            command = %label,
            args = command.get_args().len(),
            pid = child.id(),
            "Spawned process"
        );

        let classifier = (!self.error_categories.is_empty()).then(|| {
            Classifier::new(self.error_categories.clone(), self.category_state.clone())
        });

        Ok(Execution::new(
            label,
            child,
            command.take_stdin(),
            self.stdout.clone().unwrap_or_else(stdout_writer),
            self.stderr.clone().unwrap_or_else(stderr_writer),
            classifier,
        ))
    }
}
