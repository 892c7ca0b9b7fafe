//! Subprocess execution with streamed, prefixed output

use crate::error::{Result, TerraformError};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

/// Red foreground colour, which terraform uses to highlight errors
const ANSI_RED: &str = "\x1b[31m";

/// How a command is spawned and how its output is relayed
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Working directory of the child process
    pub cwd: Option<PathBuf>,

    /// Tag prepended to every relayed output line
    pub prefix: Option<String>,

    /// Remove the red colour sequence from output lines
    pub strip_errors: bool,

    /// Kill the child if it runs longer than this
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn strip_errors(mut self, strip_errors: bool) -> Self {
        self.strip_errors = strip_errors;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Run `program` with `args`, relaying stdout and stderr line by line.
///
/// Returns the exit status; a non-zero exit is not an error here. When the
/// timeout elapses the child is killed and [`TerraformError::Timeout`] is
/// returned.
pub async fn run_command(program: &Path, args: &[String], options: &RunOptions) -> Result<ExitStatus> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    tracing::debug!("Running: {} {}", program.display(), args.join(" "));

    let mut child = cmd.spawn()?;

    let Some(timeout) = options.timeout else {
        return Ok(relay(&mut child, options).await?);
    };

    let relayed = tokio::time::timeout(timeout, relay(&mut child, options)).await;
    match relayed {
        Ok(status) => Ok(status?),
        Err(_) => {
            tracing::warn!(
                "{} exceeded {}s, killing process",
                program.display(),
                timeout.as_secs()
            );
            child.kill().await?;
            Err(TerraformError::Timeout {
                command: format!("{} {}", program.display(), args.join(" ")),
                timeout,
            })
        }
    }
}

/// Run `program` and return its stdout, failing on a non-zero exit
pub async fn capture_command(program: &Path, args: &[String], cwd: Option<&Path>) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!("Running: {} {}", program.display(), args.join(" "));

    let output = cmd.output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TerraformError::CommandFailed {
            command: args.first().cloned().unwrap_or_default(),
            message: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

async fn relay(child: &mut Child, options: &RunOptions) -> std::io::Result<ExitStatus> {
    let prefix = options
        .prefix
        .as_ref()
        .map(|p| format!("[{}]: ", p))
        .unwrap_or_default();

    let (out, err) = tokio::join!(
        forward_lines(child.stdout.take(), &prefix, options.strip_errors),
        forward_lines(child.stderr.take(), &prefix, options.strip_errors),
    );
    out?;
    err?;

    child.wait().await
}

async fn forward_lines<R>(reader: Option<R>, prefix: &str, strip_errors: bool) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let line = if strip_errors {
            strip_error_color(&line)
        } else {
            line
        };
        tracing::info!("{}{}", prefix, line);
    }

    Ok(())
}

/// Drop the red colour escape so expected failures don't read as errors
pub fn strip_error_color(line: &str) -> String {
    line.replace(ANSI_RED, "")
}

/// Await `future`, logging how long it took under `label`
pub async fn timed<F: Future>(label: &str, future: F) -> F::Output {
    let start = Instant::now();
    let output = future.await;
    tracing::info!("{} took {:.3} [s]", label, start.elapsed().as_secs_f64());
    output
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    #[serial]
    async fn test_exit_status_is_returned() {
        let ok = run_command(Path::new("sh"), &sh("echo hello"), &RunOptions::new())
            .await
            .unwrap();
        assert!(ok.success());

        let failed = run_command(Path::new("sh"), &sh("echo oops >&2; exit 3"), &RunOptions::new())
            .await
            .unwrap();
        assert_eq!(failed.code(), Some(3));
    }

    #[tokio::test]
    #[serial]
    async fn test_runs_in_working_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let options = RunOptions::new().cwd(temp_dir.path()).prefix("test");

        let status = run_command(Path::new("sh"), &sh("touch marker"), &options)
            .await
            .unwrap();
        assert!(status.success());
        assert!(temp_dir.path().join("marker").exists());
    }

    #[tokio::test]
    #[serial]
    async fn test_timeout_kills_child() {
        let options = RunOptions::new().timeout(Duration::from_millis(200));

        let start = Instant::now();
        let result = run_command(Path::new("sh"), &sh("sleep 10"), &options).await;
        assert!(matches!(result, Err(TerraformError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[serial]
    async fn test_capture_command() {
        let stdout = capture_command(Path::new("sh"), &sh("printf '{\"a\": 1}'"), None)
            .await
            .unwrap();
        assert_eq!(stdout, "{\"a\": 1}");

        let err = capture_command(Path::new("sh"), &sh("echo denied >&2; exit 1"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_strip_error_color() {
        assert_eq!(
            strip_error_color("\x1b[31mError:\x1b[0m resource exists"),
            "Error:\x1b[0m resource exists"
        );
        assert_eq!(strip_error_color("plain"), "plain");
    }

    #[tokio::test]
    async fn test_timed_passes_output_through() {
        let value = timed("noop", async { 42 }).await;
        assert_eq!(value, 42);
    }
}
