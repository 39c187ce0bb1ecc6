//! Build script spawning and control.
//!
//! This module provides a builder for configuring the build script
//! invocation, along with control methods for the running child.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use super::OutputLines;

/// Flag passed to build scripts so they compile without proving.
pub const DEFAULT_COMPILE_FLAG: &str = "--compile-only";

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The script was not found.
    #[error("Build script not found: {0}")]
    NotFound(PathBuf),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error, script: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(script.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(script.to_path_buf()),
            _ => Self::Io(err),
        }
    }
}

/// Builder for configuring a build script invocation.
#[derive(Debug, Clone)]
pub struct BuildCommand {
    script: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl BuildCommand {
    /// Invoke `script` with the default compile-only flag.
    #[must_use]
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            args: vec![DEFAULT_COMPILE_FLAG.to_string()],
            working_dir: None,
        }
    }

    /// Replace the argument list.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory for the child.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn script(&self) -> &Path {
        &self.script
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Fail with `SpawnError::NotFound` unless the script is an existing file.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError::NotFound` if the script path does not exist.
    pub fn validate(&self) -> Result<(), SpawnError> {
        if self.script.is_file() {
            Ok(())
        } else {
            Err(SpawnError::NotFound(self.script.clone()))
        }
    }
}

/// A running build script.
#[derive(Debug)]
pub struct BuildProcess {
    child: Child,
}

impl BuildProcess {
    /// Spawn the build with stdout and stderr captured together.
    ///
    /// Returns the process and its output lines in the order the build
    /// wrote them. The caller owns the stream; the process keeps no copy.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the output pipe cannot be created or the
    /// process fails to spawn.
    pub fn spawn(command: &BuildCommand) -> Result<(Self, OutputLines), SpawnError> {
        let mut cmd = Command::new(&command.script);
        cmd.args(&command.args).stdin(Stdio::null());

        if let Some(ref dir) = command.working_dir {
            cmd.current_dir(dir);
        }

        let (child, output) = spawn_captured(cmd, &command.script)?;

        tracing::info!(
            script = %command.script.display(),
            args = ?command.args,
            pid = child.id(),
            "Build process spawned"
        );

        Ok((Self { child }, output))
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Ask the process to terminate without waiting for it.
    ///
    /// On Unix this sends SIGTERM so the build script can clean up its own
    /// children. On other platforms it falls back to an immediate kill.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be delivered.
    pub fn request_terminate(&mut self) -> std::io::Result<()> {
        let Some(pid) = self.id() else {
            // Already reaped
            return Ok(());
        };

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
            tracing::info!(pid, "Sending SIGTERM to build process");
            kill(nix_pid, Signal::SIGTERM).map_err(std::io::Error::from)
        }

        #[cfg(not(unix))]
        {
            tracing::info!(pid, "Killing build process");
            self.child.start_kill()
        }
    }
}

/// Point stdout and stderr at one pipe so lines keep their write order.
///
/// The parent's copies of the write end live only in `cmd`, which is
/// dropped before returning, so the stream ends once the build (and any
/// children it left running) close their output.
#[cfg(unix)]
fn spawn_captured(mut cmd: Command, script: &Path) -> Result<(Child, OutputLines), SpawnError> {
    use std::os::fd::OwnedFd;
    use tokio::net::unix::pipe;

    let (reader, writer) = std::io::pipe()?;
    cmd.stdout(Stdio::from(writer.try_clone()?))
        .stderr(Stdio::from(writer));

    let child = cmd.spawn().map_err(|e| SpawnError::from_io(e, script))?;
    drop(cmd);

    let reader = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
    Ok((child, super::line_stream(reader)))
}

/// Without unix pipes, merge the two streams as lines arrive.
#[cfg(not(unix))]
fn spawn_captured(mut cmd: Command, script: &Path) -> Result<(Child, OutputLines), SpawnError> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| SpawnError::from_io(e, script))?;
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.start_kill();
        return Err(SpawnError::Io(std::io::Error::other(
            "build output was not captured",
        )));
    };
    Ok((child, super::merged_lines(stdout, stderr)))
}
