use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::foundation::error::{CardError, CardResult};

/// Program used to reach into a running container.
pub const CONTAINER_RUNTIME: &str = "docker";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A program plus its arguments. Never passed through a shell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandLine {
    /// Program name or path.
    pub program: OsString,
    /// Arguments, in order.
    pub args: Vec<OsString>,
}

impl CommandLine {
    /// Start a command line for `program`.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Human-readable rendering for logs.
    pub fn display(&self) -> String {
        let mut out = self.program.to_string_lossy().into_owned();
        for a in &self.args {
            out.push(' ');
            let a = a.to_string_lossy();
            if a.is_empty() || a.contains(char::is_whitespace) {
                out.push_str(&format!("{a:?}"));
            } else {
                out.push_str(&a);
            }
        }
        out
    }
}

/// Captured result of a finished command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Returns `true` for exit code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes render commands and removes their scratch files.
///
/// Implemented by [`CommandRunner`]; tests substitute counting stubs.
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion and capture its output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::code`], not as an error.
    fn execute(&self, command: &CommandLine) -> CardResult<CommandOutput>;

    /// Remove each path if present. Absent paths are ignored.
    fn cleanup(&self, paths: &[PathBuf]) {
        remove_files(paths);
    }
}

/// Runs commands on the host, or inside a running container when one is configured.
#[derive(Clone, Debug, Default)]
pub struct CommandRunner {
    container: Option<String>,
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Runner for the host's own tool installation.
    pub fn host() -> Self {
        Self::default()
    }

    /// Runner that executes inside the named container.
    pub fn container(id: impl Into<String>) -> Self {
        Self {
            container: Some(id.into()),
            timeout: None,
        }
    }

    /// Host mode when `container` is `None`, container mode otherwise.
    pub fn new(container: Option<String>) -> Self {
        Self {
            container: container.filter(|id| !id.trim().is_empty()),
            timeout: None,
        }
    }

    /// Kill commands that run longer than `timeout`.
    ///
    /// In container mode only the local `docker exec` client is killed; the process inside
    /// the container keeps running and may still write its output after cleanup.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Container id in use, if any.
    pub fn container_id(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// The command that is actually spawned for `command`.
    pub fn wrap(&self, command: &CommandLine) -> CommandLine {
        match &self.container {
            None => command.clone(),
            Some(id) => CommandLine::new(CONTAINER_RUNTIME)
                .args(["exec", id.as_str()])
                .arg(command.program.clone())
                .args(command.args.iter().cloned()),
        }
    }
}

impl CommandExecutor for CommandRunner {
    fn execute(&self, command: &CommandLine) -> CardResult<CommandOutput> {
        let wrapped = self.wrap(command);
        tracing::debug!(command = %wrapped.display(), "executing");
        run(&wrapped, self.timeout)
    }
}

fn run(command: &CommandLine, timeout: Option<Duration>) -> CardResult<CommandOutput> {
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            CardError::render(format!(
                "failed to spawn '{}': {e}",
                command.program.to_string_lossy()
            ))
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        None => child
            .wait()
            .map_err(|e| CardError::render(format!("failed to wait for command: {e}")))?,
        Some(limit) => wait_with_deadline(&mut child, limit)?,
    };

    let stdout = join_drain(stdout)?;
    let stderr = join_drain(stderr)?;
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        code: status.code(),
    })
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> CardResult<std::process::ExitStatus> {
    let deadline = Instant::now() + limit;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CardError::render(format!(
                    "command timed out after {:.1}s",
                    limit.as_secs_f64()
                )));
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(CardError::render(format!(
                    "failed to poll command status: {e}"
                )));
            }
        }
    }
}

type Drain = Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    })
}

fn join_drain(handle: Drain) -> CardResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| CardError::render("output drain thread panicked"))?
            .map_err(|e| CardError::render(format!("failed to read command output: {e}"))),
        None => Ok(Vec::new()),
    }
}

/// Remove each file if it exists.
pub fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        remove_file_if_present(path);
    }
}

fn remove_file_if_present(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed scratch file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "failed to remove scratch file: {e}"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/runner.rs"]
mod tests;
