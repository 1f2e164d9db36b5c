//! Process spawning abstraction

use crate::command::Command;
use async_process::Stdio;
use std::io;

pub use async_process::Child;

/// Starts child processes on behalf of a runner.
///
/// Implementations must pipe stdout and stderr, and pipe stdin whenever the
/// command carries stdin input. The runner relays whatever pipes the returned
/// child exposes.
pub trait Spawner: Send + Sync {
    /// Spawn `command`
    fn spawn(&self, command: &Command) -> io::Result<Child>;
}

/// Spawner for processes on the local machine
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn(&self, command: &Command) -> io::Result<Child> {
        let mut cmd = command.prepare();

        if command.has_stdin() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        cmd.spawn()
    }
}

impl<F> Spawner for F
where
    F: Fn(&Command) -> io::Result<Child> + Send + Sync,
{
    fn spawn(&self, command: &Command) -> io::Result<Child> {
        self(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_local_spawner_pipes_output() {
        futures::executor::block_on(async {
            let mut cmd = Command::new("/bin/sh");
            cmd.arg("-c").arg("exit 0");
            let mut child = LocalSpawner.spawn(&cmd).unwrap();

            assert!(child.stdin.is_none());
            assert!(child.stdout.is_some());
            assert!(child.stderr.is_some());
            assert!(child.status().await.unwrap().success());
        });
    }

    #[test]
    #[cfg(unix)]
    fn test_local_spawner_pipes_stdin_when_requested() {
        futures::executor::block_on(async {
            let mut cmd = Command::new("/bin/cat");
            cmd.stdin_bytes("data");
            let mut child = LocalSpawner.spawn(&cmd).unwrap();

            assert!(child.stdin.is_some());
            drop(child.stdin.take());
            assert!(child.status().await.unwrap().success());
        });
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let cmd = Command::new("this_command_does_not_exist_12345");
        assert!(LocalSpawner.spawn(&cmd).is_err());
    }
}
