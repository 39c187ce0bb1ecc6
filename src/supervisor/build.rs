//! Supervision of one build script run.
//!
//! The supervisor launches the build, then drains its merged output on a
//! background task. Every line goes to the durable log first and then
//! through the classifier into the status store. Nothing else connects
//! the build to the dashboard.

use std::process::ExitStatus;
use std::sync::Arc;

use chrono::Utc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::classifier::LogClassifier;
use crate::history::{describe_exit, HistoryEntry, HistoryLog};
use crate::process::{BuildCommand, BuildProcess, PidFile};
use crate::status::{Stage, StatusKey, StatusStore};

use super::SupervisorError;

/// How a supervised run ended.
#[derive(Debug)]
pub enum BuildOutcome {
    /// The build closed its output and exited.
    Exited(ExitStatus),
    /// The build closed its output but its exit status could not be read.
    Unknown,
    /// Shutdown was requested before the build finished.
    Terminated,
}

/// Launches builds and wires their output into the status store.
#[derive(Debug, Clone)]
pub struct BuildSupervisor {
    store: StatusStore,
    classifier: Arc<LogClassifier>,
    pid_file: PidFile,
    history: Option<HistoryLog>,
}

impl BuildSupervisor {
    #[must_use]
    pub fn new(store: StatusStore, classifier: LogClassifier, pid_file: PidFile) -> Self {
        Self {
            store,
            classifier: Arc::new(classifier),
            pid_file,
            history: None,
        }
    }

    /// Append a line to `history` whenever a run finishes.
    #[must_use]
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    #[must_use]
    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Start a supervised build.
    ///
    /// Validates the script, truncates the log, spawns the child, resets
    /// the status record and records the pid. Output is drained on a
    /// background task until the child closes its streams or the returned
    /// handle is shut down.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError` if the script is missing, the log cannot
    /// be created, or the child cannot be spawned. The status record is
    /// left untouched on every error.
    pub async fn start(
        &self,
        command: &BuildCommand,
        mode: &str,
        total_parts: u32,
    ) -> Result<RunningBuild, SupervisorError> {
        command.validate()?;

        let log_path = self.store.log_file().to_path_buf();
        let log = open_log(&log_path)
            .await
            .map_err(|source| SupervisorError::LogFile {
                path: log_path.clone(),
                source,
            })?;

        let (process, lines) = BuildProcess::spawn(command)?;
        let pid = process.id();

        // Output is not read until the drain starts, so nothing is lost by
        // resetting the record only once the child is running.
        self.store.init(mode, total_parts);

        if let Some(pid) = pid {
            if let Err(e) = self.pid_file.write(pid) {
                tracing::warn!(path = %self.pid_file.path().display(), error = %e, "Failed to write pid file");
            }
        }

        self.store.update(StatusKey::Stage, Stage::Starting.as_str());
        self.store
            .update(StatusKey::LogFile, log_path.display().to_string());

        let cancel = CancellationToken::new();
        let drain = OutputDrain {
            store: self.store.clone(),
            classifier: Arc::clone(&self.classifier),
            history: self.history.clone(),
            mode: mode.to_string(),
        };
        let task = tokio::spawn(drain.run(process, lines, log, cancel.clone()));

        tracing::info!(mode, pid, log = %log_path.display(), "Supervising build");

        Ok(RunningBuild {
            pid,
            cancel,
            task,
            pid_file: self.pid_file.clone(),
        })
    }
}

async fn open_log(path: &std::path::Path) -> std::io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(BufWriter::new(File::create(path).await?))
}

/// State owned by the background drain task.
struct OutputDrain {
    store: StatusStore,
    classifier: Arc<LogClassifier>,
    history: Option<HistoryLog>,
    mode: String,
}

impl OutputDrain {
    async fn run<S>(
        self,
        mut process: BuildProcess,
        mut lines: S,
        mut log: BufWriter<File>,
        cancel: CancellationToken,
    ) -> BuildOutcome
    where
        S: tokio_stream::Stream<Item = std::io::Result<String>> + Unpin,
    {
        let mut line_count: u64 = 0;

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!(lines = line_count, "Build shutdown requested");
                    if let Err(e) = process.request_terminate() {
                        tracing::warn!(error = %e, "Failed to signal build process");
                    }
                    let _ = log.flush().await;
                    return BuildOutcome::Terminated;
                }
                next = lines.next() => match next {
                    Some(Ok(line)) => {
                        line_count += 1;
                        append_log_line(&mut log, &line).await;
                        self.classifier.process_line(&line, &self.store);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Unreadable build output line");
                    }
                    None => break,
                },
            }
        }

        tracing::debug!(lines = line_count, "Build output closed");

        let waited = tokio::select! {
            biased;

            () = cancel.cancelled() => None,
            status = process.wait() => Some(status),
        };
        let Some(status) = waited else {
            if let Err(e) = process.request_terminate() {
                tracing::warn!(error = %e, "Failed to signal build process");
            }
            return BuildOutcome::Terminated;
        };

        // A failing build also ends as complete; the exit code only reaches
        // the log and the history file.
        self.store.update(StatusKey::Stage, Stage::Complete.as_str());

        match status {
            Ok(status) => {
                if status.success() {
                    tracing::info!(lines = line_count, "Build finished");
                } else {
                    tracing::warn!(lines = line_count, exit = %describe_exit(&status), "Build exited abnormally");
                }
                self.record_history(&describe_exit(&status));
                BuildOutcome::Exited(status)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to collect build exit status");
                self.record_history("exit=unknown");
                BuildOutcome::Unknown
            }
        }
    }

    fn record_history(&self, exit: &str) {
        let Some(history) = &self.history else {
            return;
        };
        let record = self.store.read();
        let now = Utc::now();
        let start = record.start_time();
        let elapsed_secs = if start > 0 {
            u64::try_from(now.timestamp() - start).unwrap_or(0)
        } else {
            0
        };
        let mode = if record.mode().is_empty() {
            self.mode.clone()
        } else {
            record.mode().to_string()
        };
        history.append(&HistoryEntry {
            finished_at: now,
            mode,
            stage: record.stage().to_string(),
            exit: exit.to_string(),
            elapsed_secs,
        });
    }
}

/// Write one line and flush so the log can be tailed live.
async fn append_log_line(log: &mut BufWriter<File>, line: &str) {
    let result = async {
        log.write_all(line.as_bytes()).await?;
        log.write_all(b"\n").await?;
        log.flush().await
    }
    .await;
    if let Err(e) = result {
        tracing::debug!(error = %e, "Failed to append to build log");
    }
}

/// Handle to a build being supervised in the background.
#[derive(Debug)]
pub struct RunningBuild {
    pid: Option<u32>,
    cancel: CancellationToken,
    task: JoinHandle<BuildOutcome>,
    pid_file: PidFile,
}

impl RunningBuild {
    /// Process id of the build script.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the drain task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the build to finish on its own.
    pub async fn wait(self) -> BuildOutcome {
        let outcome = join_outcome(self.task).await;
        self.pid_file.remove();
        outcome
    }

    /// Ask the build to terminate and release the pid file.
    ///
    /// A build that already finished keeps its outcome. The terminate
    /// request is sent but the child's exit is not awaited.
    pub async fn shutdown(self) -> BuildOutcome {
        self.cancel.cancel();
        let outcome = join_outcome(self.task).await;
        self.pid_file.remove();
        outcome
    }
}

async fn join_outcome(task: JoinHandle<BuildOutcome>) -> BuildOutcome {
    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Build supervision task failed");
            BuildOutcome::Unknown
        }
    }
}
