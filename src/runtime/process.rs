//! Runtime binary process execution

use crate::error::{QuayError, Result};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Default runtime binary
pub const DEFAULT_RUNTIME: &str = "container";

/// Exit status and standard output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
    /// Everything written to stdout
    pub stdout: Vec<u8>,
}

impl CapturedOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes argument vectors against the runtime binary
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// Name of the binary, used for logging
    fn program(&self) -> &str;

    /// Run to completion capturing stdout; stderr goes to ours
    async fn capture(&self, args: &[String]) -> Result<CapturedOutput>;

    /// Run to completion with our stdin, stdout and stderr attached
    async fn execute(&self, args: &[String]) -> Result<Option<i32>>;
}

/// Runs the runtime binary as a subprocess
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    program: String,
}

impl ProcessRuntime {
    /// Create a runtime invoking `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ProcessRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME)
    }
}

impl ContainerRuntime for ProcessRuntime {
    fn program(&self) -> &str {
        &self.program
    }

    async fn capture(&self, args: &[String]) -> Result<CapturedOutput> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| QuayError::Io(std::io::Error::other("child stdout not captured")))?;

        // Drain stdout while waiting, or a child that fills the pipe never exits.
        let mut buf = Vec::new();
        let (read, status) = tokio::join!(stdout.read_to_end(&mut buf), child.wait());
        read?;
        let status = status?;

        tracing::debug!(
            "{} {} exited with {:?} ({} bytes)",
            self.program,
            args.join(" "),
            status.code(),
            buf.len()
        );

        Ok(CapturedOutput {
            code: status.code(),
            stdout: buf,
        })
    }

    async fn execute(&self, args: &[String]) -> Result<Option<i32>> {
        let status = Command::new(&self.program).args(args).status().await?;
        Ok(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_capture_stdout_and_code() {
        let runtime = ProcessRuntime::new("sh");
        let output = runtime.capture(&sh("echo '[]'; exit 3")).await.unwrap();

        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout, b"[]\n");
    }

    #[tokio::test]
    async fn test_capture_large_output_does_not_block() {
        let runtime = ProcessRuntime::new("sh");
        let output = runtime
            .capture(&sh("head -c 1048576 /dev/zero"))
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.len(), 1_048_576);
    }

    #[tokio::test]
    async fn test_execute_exit_code() {
        let runtime = ProcessRuntime::new("sh");
        assert_eq!(runtime.execute(&sh("exit 0")).await.unwrap(), Some(0));
        assert_eq!(runtime.execute(&sh("exit 42")).await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let runtime = ProcessRuntime::new("quay-no-such-runtime-binary");
        assert!(matches!(
            runtime.capture(&[]).await,
            Err(QuayError::Io(_))
        ));
        assert!(runtime.execute(&[]).await.is_err());
    }

    #[test]
    fn test_default_program() {
        assert_eq!(ProcessRuntime::default().program(), "container");
    }
}
