//! Builder for running one external tool invocation and classifying how it
//! ended.
//!
//! Output from both streams is read incrementally while the child runs. A
//! bounded tail of recent lines is kept for exit classification and for
//! diagnostics; every line is also logged at `trace` level.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Lines of recent output kept per stream.
const TAIL_LINES: usize = 50;

/// Default interval between "still running" check-ins.
pub const DEFAULT_CHECKIN_INTERVAL: Duration = Duration::from_secs(60);

/// A nonzero exit that should be treated as success.
///
/// When `marker` is set, the exit only counts as benign if the marker text
/// appears in the recent stdout or stderr of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenignExit {
    pub code: i32,
    pub marker: Option<String>,
}

impl BenignExit {
    /// Benign whenever the process exits with `code`.
    pub fn code(code: i32) -> Self {
        Self { code, marker: None }
    }

    /// Benign only when the process exits with `code` and printed `marker`.
    pub fn with_marker(code: i32, marker: impl Into<String>) -> Self {
        Self {
            code,
            marker: Some(marker.into()),
        }
    }
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Display name of the tool.
    pub tool: String,
    /// Whether the run counts as a success (exit 0 or a benign exit).
    pub success: bool,
    /// Raw exit code. `None` if the process could not be spawned or was
    /// killed by a signal.
    pub code: Option<i32>,
    /// Recent standard output lines.
    pub stdout: String,
    /// Recent standard error lines.
    pub stderr: String,
    /// Set when the binary could not be started.
    pub spawn_error: Option<String>,
    /// Number of "still running" summaries logged while the tool ran.
    pub checkins: u32,
}

impl ProcessResult {
    fn spawn_failed(tool: String, message: String) -> Self {
        Self {
            tool,
            success: false,
            code: None,
            stdout: String::new(),
            stderr: String::new(),
            spawn_error: Some(message),
            checkins: 0,
        }
    }

    /// `true` when the process exited nonzero but was classified as success.
    pub fn is_benign(&self) -> bool {
        self.success && self.code.is_some_and(|c| c != 0)
    }

    /// The last non-empty line the tool printed on either stream.
    pub fn last_line(&self) -> Option<&str> {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .filter(|l| !l.trim().is_empty())
            .last()
    }

    /// Turn an unsuccessful result into the matching error.
    ///
    /// Spawn failures become [`dvr_core::Error::Spawn`]; everything else is a
    /// [`dvr_core::Error::ToolExit`] with a generic message.
    pub fn into_error(self) -> dvr_core::Error {
        if let Some(message) = self.spawn_error {
            return dvr_core::Error::spawn(self.tool, message);
        }
        let message = match self.code {
            Some(code) => format!("{} exited with code {code}", self.tool),
            None => format!("{} was terminated by a signal", self.tool),
        };
        dvr_core::Error::tool_exit(self.tool, self.code, message)
    }
}

/// A builder for constructing and running external tool invocations.
///
/// Each invocation gets a fresh argument list; nothing is shared between
/// runs.
///
/// # Example
///
/// ```no_run
/// use dvr_av::ToolCommand;
/// use std::path::PathBuf;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> dvr_core::Result<()> {
/// let result = ToolCommand::new(PathBuf::from("ccextractor"))
///     .args(["-in=ts", "-out=srt"])
///     .arg("/tmp/plex-abc/show.ts")
///     .benign(dvr_av::BenignExit::code(10))
///     .run(&CancellationToken::new())
///     .await?;
/// println!("success: {}", result.success);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    env_remove: Vec<String>,
    benign: Vec<BenignExit>,
    checkin: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            env_remove: Vec::new(),
            benign: Vec::new(),
            checkin: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Remove an environment variable from the child's environment only.
    pub fn env_remove(&mut self, key: impl Into<String>) -> &mut Self {
        self.env_remove.push(key.into());
        self
    }

    /// Register a nonzero exit that should count as success.
    pub fn benign(&mut self, exit: BenignExit) -> &mut Self {
        self.benign.push(exit);
        self
    }

    /// Emit a summary of the latest output at this interval while the tool
    /// runs, but only when the output changed since the last check-in.
    pub fn checkin(&mut self, interval: Option<Duration>) -> &mut Self {
        self.checkin = interval;
        self
    }

    /// The program this command will spawn.
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// The argument list, in order.
    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    /// Display name of the tool (the program's file name).
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run the command to completion and classify its exit.
    ///
    /// A binary that cannot be started yields a result with `code: None`
    /// and `spawn_error` set rather than an `Err`.
    ///
    /// # Errors
    ///
    /// - [`dvr_core::Error::Interrupted`] if `cancel` fires while the child
    ///   runs; the child is killed first.
    /// - [`dvr_core::Error::Io`] if waiting on the child fails.
    pub async fn run(&self, cancel: &CancellationToken) -> dvr_core::Result<ProcessResult> {
        let tool = self.tool_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for key in &self.env_remove {
            cmd.env_remove(key);
        }

        tracing::debug!("{} {}", self.program.display(), self.args.join(" "));

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("{tool} could not be started: {e}");
                return Ok(ProcessResult::spawn_failed(tool, e.to_string()));
            }
        };

        let tail = Arc::new(Mutex::new(OutputTail::default()));
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(pump(stdout, Stream::Stdout, tail.clone(), tool.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(pump(stderr, Stream::Stderr, tail.clone(), tool.clone())));
        }

        let mut checkin = self.checkin.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut last_seen = 0u64;
        let mut checkins = 0u32;

        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                _ = cancel.cancelled() => {
                    tracing::warn!("Interrupted while {tool} was running; stopping it");
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill {tool}: {e}");
                    }
                    return Err(dvr_core::Error::Interrupted);
                }
                _ = next_tick(&mut checkin) => {
                    let guard = tail.lock();
                    if guard.generation != last_seen {
                        last_seen = guard.generation;
                        if let Some(line) = guard.latest.as_deref() {
                            tracing::info!("{tool} is still running: {line}");
                            checkins += 1;
                        }
                    }
                }
            }
        };
        // The check-in timer is dropped with the loop.
        drop(checkin);

        for handle in pumps {
            let _ = handle.await;
        }

        let tail = std::mem::take(&mut *tail.lock());
        let code = status.code();
        let stdout = tail.joined(Stream::Stdout);
        let stderr = tail.joined(Stream::Stderr);
        let success = match code {
            Some(0) => true,
            Some(c) => self.benign.iter().any(|b| {
                b.code == c
                    && b
                        .marker
                        .as_deref()
                        .map_or(true, |m| stdout.contains(m) || stderr.contains(m))
            }),
            None => false,
        };

        tracing::debug!("{tool} exited with {status} (success: {success})");

        Ok(ProcessResult {
            tool,
            success,
            code,
            stdout,
            stderr,
            spawn_error: None,
            checkins,
        })
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Default)]
struct OutputTail {
    stdout: VecDeque<String>,
    stderr: VecDeque<String>,
    latest: Option<String>,
    generation: u64,
}

impl OutputTail {
    fn push(&mut self, stream: Stream, line: &str) {
        let buf = match stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        if buf.len() == TAIL_LINES {
            buf.pop_front();
        }
        buf.push_back(line.to_string());
        self.latest = Some(line.to_string());
        self.generation += 1;
    }

    fn joined(&self, stream: Stream) -> String {
        let buf = match stream {
            Stream::Stdout => &self.stdout,
            Stream::Stderr => &self.stderr,
        };
        buf.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Read a child stream until EOF, splitting on both `\n` and `\r` so
/// progress lines from encoders show up as they are printed.
///
/// `AsyncBufReadExt::lines` only splits on `\n`, which would hold back
/// every carriage-return progress update until the encode finishes.
/// Bytes are buffered until a separator arrives and each line is decoded
/// on its own, so a character split across two reads stays intact.
async fn pump<R>(mut reader: R, stream: Stream, tail: Arc<Mutex<OutputTail>>, tool: String)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 8192];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("{tool}: error reading {stream:?}: {e}");
                break;
            }
        };
        pending.extend_from_slice(&buf[..n]);

        while let Some(pos) = pending.iter().position(|&b| b == b'\r' || b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            emit_line(&line[..pos], stream, &tail, &tool);
        }
    }

    emit_line(&pending, stream, &tail, &tool);
}

fn emit_line(bytes: &[u8], stream: Stream, tail: &Mutex<OutputTail>, tool: &str) {
    let line = String::from_utf8_lossy(bytes);
    if !line.trim().is_empty() {
        tracing::trace!("[{tool}] {line}");
        tail.lock().push(stream, &line);
    }
}
