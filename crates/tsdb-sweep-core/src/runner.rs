//! Running external commands with a wall-clock limit.
//!
//! Every interaction with the `tsdb` tool goes through [`CommandRunner`], so
//! the orchestration logic can be exercised without a real TSDB. The
//! production implementation, [`SystemRunner`], launches the program directly
//! from an argument vector (no shell), captures stdout and stderr separately,
//! and on timeout kills the child's whole process group.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;

use crate::error::RunError;

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A zero-exit result with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A non-zero exit with no output.
    pub fn failure(code: i32) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn from_parts(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }
}

/// Executes an argument vector and waits for it.
pub trait CommandRunner {
    /// Run `argv[0]` with the remaining elements as arguments.
    ///
    /// With `timeout` set, a child still running after that long is killed
    /// and [`RunError::TimedOut`] is returned.
    fn run(&self, argv: &[String], timeout: Option<Duration>) -> Result<CommandOutput, RunError>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], timeout: Option<Duration>) -> Result<CommandOutput, RunError> {
        let (program, args) = argv.split_first().ok_or(RunError::EmptyCommand)?;
        debug!("exec: {}", argv.join(" "));

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so a timeout also takes down anything the
            // launcher script forked (sudo, java).
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Drain both pipes concurrently so a chatty child never blocks on a
        // full pipe buffer while we wait for it.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = timeout.map(|t| Instant::now() + t);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        kill_process_group(&mut child);
                        let _ = child.wait();
                        // A descendant that escaped the group can keep the
                        // pipes open; detach the readers instead of joining.
                        drop(stdout);
                        drop(stderr);
                        return Err(RunError::TimedOut {
                            program: program.clone(),
                            after: timeout.unwrap_or_default(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(source) => {
                    kill_process_group(&mut child);
                    let _ = child.wait();
                    return Err(RunError::Io {
                        program: program.clone(),
                        source,
                    });
                }
            }
        };

        let io_err = |source: std::io::Error| RunError::Io {
            program: program.clone(),
            source,
        };
        let out = collect(stdout).map_err(io_err)?;
        let err = collect(stderr).map_err(io_err)?;
        Ok(CommandOutput::from_parts(status, &out, &err))
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> std::io::Result<Vec<u8>> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| std::io::Error::other("pipe reader thread panicked"))?,
        None => Ok(Vec::new()),
    }
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: kill(2) with a negative pid signals every process in the group
    // whose id equals the child's pid; the child was spawned as that group's
    // leader and has not been reaped yet, so the id cannot have been reused.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

/// Scripted runner for unit tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;

    use super::*;

    type Handler = Box<dyn Fn(&[String]) -> Result<CommandOutput, RunError>>;

    /// Answers every command through a closure and records each argv.
    pub(crate) struct ScriptedRunner {
        handler: Handler,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new(
            handler: impl Fn(&[String]) -> Result<CommandOutput, RunError> + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }

        /// Recorded calls whose argv contains `word` as a whole argument.
        pub(crate) fn calls_with(&self, word: &str) -> Vec<Vec<String>> {
            self.calls
                .borrow()
                .iter()
                .filter(|argv| argv.iter().any(|a| a == word))
                .cloned()
                .collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(
            &self,
            argv: &[String],
            _timeout: Option<Duration>,
        ) -> Result<CommandOutput, RunError> {
            self.calls.borrow_mut().push(argv.to_vec());
            (self.handler)(argv)
        }
    }

    pub(crate) fn timed_out() -> RunError {
        RunError::TimedOut {
            program: "tsdb".to_string(),
            after: Duration::from_secs(900),
        }
    }

    pub(crate) fn spawn_failure() -> RunError {
        RunError::Spawn {
            program: "tsdb".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }
}
