//! External helper process adapter
//!
//! A helper receives the input on stdin, may print `PROGRESS:<n>` lines on
//! stderr while it works, and prints the digest on stdout before exiting with
//! status 0. When the engine knows the input size it is passed as the last
//! command-line argument.
//!
//! Every spawned child has `kill_on_drop(true)` and its PID is published in a
//! [`ChildSlot`] until it has been reaped, so a cancel request can wait for
//! the slot to empty.

use crate::cancel::CancelToken;
use crate::error::{IoError, ToolError};
use crate::progress::MonotonicPercent;
use crate::results::Outcome;
use crate::{Error, Result};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Most stderr text kept for error messages
const MAX_DIAGNOSTICS: usize = 4096;

/// Everything needed to run one helper invocation
#[derive(Debug, Clone, Copy)]
pub(crate) struct HelperInvocation<'a> {
    /// Algorithm name, used in errors and logs
    pub algorithm: &'a str,
    pub executable: &'a Path,
    pub args: &'a [String],
    /// Appended as the final argument when known
    pub size_hint: Option<u64>,
    /// File the input comes from, for error context
    pub source: Option<&'a Path>,
    pub chunk_size: usize,
    /// Smallest advance between forwarded progress values
    pub progress_step: u8,
    pub terminate_grace: Duration,
    pub deadline: Option<Duration>,
}

/// Publishes the PID of the live helper, if any
#[derive(Debug, Clone)]
pub(crate) struct ChildSlot {
    tx: Arc<watch::Sender<Option<u32>>>,
}

impl Default for ChildSlot {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }
}

impl ChildSlot {
    pub(crate) fn current(&self) -> Option<u32> {
        *self.tx.borrow()
    }

    /// Resolve once no helper is registered
    pub(crate) async fn wait_empty(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(Option::is_none).await;
    }

    fn occupy(&self, pid: Option<u32>) -> SlotGuard<'_> {
        self.tx.send_replace(pid);
        SlotGuard { slot: self }
    }
}

/// Clears the slot once the child has been reaped or dropped
struct SlotGuard<'a> {
    slot: &'a ChildSlot,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slot.tx.send_replace(None);
    }
}

enum Exchange {
    Exited(ExitStatus),
    Cancelled,
}

/// Forwards helper progress through the stepped monotonic gate
struct ProgressSink<'a> {
    gate: MonotonicPercent,
    callback: &'a mut (dyn FnMut(u8) + Send),
}

impl ProgressSink<'_> {
    fn push(&mut self, percent: u8) {
        if let Some(percent) = self.gate.observe(percent) {
            (self.callback)(percent);
        }
    }

    fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<u8>) {
        while let Ok(percent) = rx.try_recv() {
            self.push(percent);
        }
    }
}

/// Parse a `PROGRESS:<n>` stderr line
///
/// Only the leading digits after the prefix count; values above 100 are
/// clamped. Anything else is not a progress line.
pub fn parse_progress_line(line: &str) -> Option<u8> {
    let rest = line.trim().strip_prefix("PROGRESS:")?.trim_start();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return None;
    }
    // Overlong digit runs are still "more than 100"
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    Some(value.min(100) as u8)
}

/// Run a helper over `input` and return the digest it prints
pub(crate) async fn run_helper<R>(
    invocation: HelperInvocation<'_>,
    input: R,
    cancel: &CancelToken,
    slot: &ChildSlot,
    on_progress: &mut (dyn FnMut(u8) + Send),
) -> Result<Outcome<String>>
where
    R: AsyncRead + Unpin + Send,
{
    let algorithm = invocation.algorithm;
    let mut child = spawn(&invocation)?;
    let guard = slot.occupy(child.id());
    log::debug!(
        "Started helper for '{algorithm}' ({}) pid={:?}",
        invocation.executable.display(),
        child.id()
    );

    let stdin = child.stdin.take();
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let mut stderr_task = spawn_stderr_reader(child.stderr.take(), progress_tx);
    let mut stdout_task = spawn_stdout_reader(child.stdout.take());

    let mut sink = ProgressSink {
        gate: MonotonicPercent::with_step(invocation.progress_step),
        callback: on_progress,
    };

    let exchange = exchange(
        &invocation,
        &mut child,
        stdin,
        input,
        &mut progress_rx,
        &mut sink,
        cancel,
    );
    let result = match invocation.deadline {
        Some(limit) => match tokio::time::timeout(limit, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::timeout(algorithm, limit).into()),
        },
        None => exchange.await,
    };

    let status = match result {
        Ok(Exchange::Exited(status)) => status,
        Ok(Exchange::Cancelled) => {
            log::debug!("Cancelling helper for '{algorithm}'");
            terminate(&mut child, invocation.terminate_grace, algorithm).await;
            stderr_task.abort();
            stdout_task.abort();
            return Ok(Outcome::Cancelled);
        }
        Err(e) => {
            terminate(&mut child, invocation.terminate_grace, algorithm).await;
            stderr_task.abort();
            stdout_task.abort();
            return Err(e);
        }
    };

    // Reaped: the PID may be reused from here on
    drop(guard);

    // The child has exited; its pipes close unless something inherited them
    let diagnostics =
        match tokio::time::timeout(invocation.terminate_grace, &mut stderr_task).await {
            Ok(Ok(text)) => text,
            _ => {
                stderr_task.abort();
                String::new()
            }
        };
    sink.drain(&mut progress_rx);

    let stdout = match tokio::time::timeout(invocation.terminate_grace, &mut stdout_task).await {
        Ok(Ok(Ok(bytes))) => bytes,
        Ok(Ok(Err(e))) => {
            return Err(ToolError::failed(algorithm, format!("reading output failed: {e}")).into());
        }
        Ok(Err(e)) => {
            return Err(ToolError::failed(algorithm, format!("output reader failed: {e}")).into());
        }
        Err(_) => {
            stdout_task.abort();
            return Err(ToolError::failed(algorithm, "output was not closed after exit").into());
        }
    };

    if !status.success() {
        let reason = if diagnostics.is_empty() {
            format!("helper {status}")
        } else {
            format!("helper {status}: {diagnostics}")
        };
        return Err(ToolError::failed(algorithm, reason).into());
    }

    let digest = String::from_utf8_lossy(&stdout).trim().to_string();
    if digest.is_empty() {
        return Err(ToolError::failed(algorithm, "helper printed no digest").into());
    }

    log::debug!("Helper for '{algorithm}' finished");
    Ok(Outcome::Completed(digest))
}

fn spawn(invocation: &HelperInvocation<'_>) -> Result<Child> {
    let mut command = Command::new(invocation.executable);
    command.args(invocation.args);
    if let Some(size) = invocation.size_hint {
        command.arg(size.to_string());
    }
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    command.spawn().map_err(|e| {
        ToolError::failed(
            invocation.algorithm,
            format!(
                "failed to start {}: {e}",
                invocation.executable.display()
            ),
        )
        .into()
    })
}

async fn exchange<R>(
    invocation: &HelperInvocation<'_>,
    child: &mut Child,
    stdin: Option<ChildStdin>,
    mut input: R,
    progress_rx: &mut mpsc::UnboundedReceiver<u8>,
    sink: &mut ProgressSink<'_>,
    cancel: &CancelToken,
) -> Result<Exchange>
where
    R: AsyncRead + Unpin + Send,
{
    let algorithm = invocation.algorithm;

    if let Some(mut stdin) = stdin {
        let mut buffer = vec![0u8; invocation.chunk_size.max(1)];
        loop {
            if cancel.is_cancelled() {
                return Ok(Exchange::Cancelled);
            }

            let filled = fill_buffer(&mut input, &mut buffer)
                .await
                .map_err(|e| input_error(e, invocation.source))?;
            if filled == 0 {
                break;
            }

            tokio::select! {
                written = stdin.write_all(&buffer[..filled]) => match written {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                        // The exit status decides whether this matters
                        log::debug!("Helper for '{algorithm}' closed its input early");
                        break;
                    }
                    Err(e) => {
                        return Err(ToolError::failed(algorithm, format!("writing input failed: {e}")).into());
                    }
                },
                _ = cancel.cancelled() => return Ok(Exchange::Cancelled),
            }

            sink.drain(progress_rx);
        }
        // Closing stdin signals end of input
        drop(stdin);
    }

    loop {
        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| {
                    Error::from(ToolError::failed(algorithm, format!("waiting for helper failed: {e}")))
                })?;
                return Ok(Exchange::Exited(status));
            }
            _ = cancel.cancelled() => return Ok(Exchange::Cancelled),
            Some(percent) = progress_rx.recv() => sink.push(percent),
        }
    }
}

/// Read until `buffer` is full or the input ends
pub(crate) async fn fill_buffer<R>(input: &mut R, buffer: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buffer.len() {
        match input.read(&mut buffer[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn input_error(error: std::io::Error, source: Option<&Path>) -> Error {
    let io_error = IoError::from_std(error);
    match source {
        Some(path) => io_error.with_path(path).into(),
        None => io_error.into(),
    }
}

fn spawn_stderr_reader(
    stderr: Option<ChildStderr>,
    progress_tx: mpsc::UnboundedSender<u8>,
) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut diagnostics = String::new();
        let Some(stderr) = stderr else {
            return diagnostics;
        };

        let mut reader = BufReader::new(stderr);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let text = String::from_utf8_lossy(&line);
            if let Some(percent) = parse_progress_line(&text) {
                let _ = progress_tx.send(percent);
            } else {
                let text = text.trim();
                if !text.is_empty() && diagnostics.len() < MAX_DIAGNOSTICS {
                    if !diagnostics.is_empty() {
                        diagnostics.push_str("; ");
                    }
                    diagnostics.push_str(text);
                }
            }
        }
        diagnostics
    })
}

fn spawn_stdout_reader(stdout: Option<ChildStdout>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    tokio::spawn(async move {
        let mut output = Vec::new();
        if let Some(mut stdout) = stdout {
            stdout.read_to_end(&mut output).await?;
        }
        Ok(output)
    })
}

/// Stop a helper: polite request first, forced kill after `grace`
async fn terminate(child: &mut Child, grace: Duration, algorithm: &str) {
    match child.try_wait() {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(e) => log::warn!("Could not poll helper for '{algorithm}': {e}"),
    }

    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: the pid belongs to our child and has not been reaped yet
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            if tokio::time::timeout(grace, child.wait()).await.is_ok() {
                return;
            }
            log::warn!("Helper for '{algorithm}' ignored SIGTERM, killing it");
        }
    }
    #[cfg(not(unix))]
    let _ = grace;

    if let Err(e) = child.kill().await {
        log::warn!("Failed to kill helper for '{algorithm}': {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_line() {
        assert_eq!(parse_progress_line("PROGRESS:42"), Some(42));
        assert_eq!(parse_progress_line("PROGRESS:7\n"), Some(7));
        assert_eq!(parse_progress_line("  PROGRESS: 15%"), Some(15));
        assert_eq!(parse_progress_line("PROGRESS:250"), Some(100));
        assert_eq!(parse_progress_line("PROGRESS:99999999999999999999999"), Some(100));
        assert_eq!(parse_progress_line("PROGRESS:"), None);
        assert_eq!(parse_progress_line("PROGRESS:abc"), None);
        assert_eq!(parse_progress_line("progress:10"), None);
        assert_eq!(parse_progress_line("warning: PROGRESS:10"), None);
    }

    #[tokio::test]
    async fn test_child_slot_tracks_guard() {
        let slot = ChildSlot::default();
        assert_eq!(slot.current(), None);
        {
            let _guard = slot.occupy(Some(1234));
            assert_eq!(slot.current(), Some(1234));
        }
        assert_eq!(slot.current(), None);
        tokio::time::timeout(Duration::from_millis(100), slot.wait_empty())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fill_buffer_reads_until_full() {
        let data = vec![7u8; 10];
        let mut input: &[u8] = &data;
        let mut buffer = [0u8; 4];
        assert_eq!(fill_buffer(&mut input, &mut buffer).await.unwrap(), 4);
        assert_eq!(fill_buffer(&mut input, &mut buffer).await.unwrap(), 4);
        assert_eq!(fill_buffer(&mut input, &mut buffer).await.unwrap(), 2);
        assert_eq!(fill_buffer(&mut input, &mut buffer).await.unwrap(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_executable_is_tool_failure() {
        let invocation = HelperInvocation {
            algorithm: "Ghost",
            executable: Path::new("/nonexistent/securehash-ghost-helper"),
            args: &[],
            size_hint: None,
            source: None,
            chunk_size: 16,
            progress_step: 5,
            terminate_grace: Duration::from_millis(100),
            deadline: None,
        };
        let slot = ChildSlot::default();
        let mut ignore = |_: u8| {};
        let err = run_helper(invocation, &b"abc"[..], &CancelToken::new(), &slot, &mut ignore)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::ExternalToolFailure { .. })));
        assert_eq!(slot.current(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_round_trip_with_shell() {
        let args = vec![
            "-c".to_string(),
            "cat > /dev/null; echo PROGRESS:50 >&2; echo PROGRESS:100 >&2; echo deadbeef".to_string(),
        ];
        let invocation = HelperInvocation {
            algorithm: "Shell",
            executable: Path::new("/bin/sh"),
            args: &args,
            size_hint: None,
            source: None,
            chunk_size: 2,
            progress_step: 5,
            terminate_grace: Duration::from_millis(500),
            deadline: Some(Duration::from_secs(10)),
        };
        let slot = ChildSlot::default();
        let mut seen = Vec::new();
        let mut record = |p: u8| seen.push(p);
        let outcome = run_helper(
            invocation,
            &b"hello world"[..],
            &CancelToken::new(),
            &slot,
            &mut record,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Completed("deadbeef".to_string()));
        assert_eq!(seen, vec![50, 100]);
        assert_eq!(slot.current(), None);
    }
}
