//! One-shot external commands (daemon subcommands, `tar`).
//!
//! The caller's task waits for the command to finish; there is no timeout.

use crate::error::NodeError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of a finished command.
#[derive(Debug)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// stdout followed by stderr, trimmed.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !out.is_empty() && !err.is_empty() {
            out.push('\n');
        }
        out.push_str(err);
        out
    }
}

/// Run `program args...`, optionally feeding `stdin`, and capture output.
///
/// A non-zero exit is not an error here; see [`run_checked`].
pub async fn run<I, S>(program: &Path, args: I, stdin: Option<&str>) -> Result<ToolOutput, NodeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let spawn_err = |source| NodeError::Spawn {
        program: program.display().to_string(),
        source,
    };
    let mut child = command.spawn().map_err(spawn_err)?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input.as_bytes()).await.map_err(spawn_err)?;
        drop(pipe);
    }

    let output = child.wait_with_output().await.map_err(spawn_err)?;
    Ok(ToolOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Like [`run`], but a non-zero exit becomes [`NodeError::Tool`] carrying
/// the combined output.
pub async fn run_checked<I, S>(
    program: &Path,
    args: I,
    stdin: Option<&str>,
) -> Result<ToolOutput, NodeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = run(program, args, stdin).await?;
    if !output.success {
        return Err(NodeError::Tool {
            tool: tool_name(program),
            output: output.combined(),
        });
    }
    Ok(output)
}

pub(crate) fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const SH: &str = "/bin/sh";

    #[tokio::test]
    async fn test_captures_both_streams() {
        let out = run(Path::new(SH), ["-c", "echo out; echo err 1>&2"], None)
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(out.combined(), "out\nerr");
    }

    #[tokio::test]
    async fn test_stdin_is_fed() {
        let out = run(Path::new(SH), ["-c", "read line; echo got:$line"], Some("words here\n"))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "got:words here");
    }

    #[tokio::test]
    async fn test_failure_carries_output() {
        let err = run_checked(Path::new(SH), ["-c", "echo boom 1>&2; exit 2"], None)
            .await
            .unwrap_err();
        match err {
            NodeError::Tool { tool, output } => {
                assert_eq!(tool, "sh");
                assert_eq!(output, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run(Path::new("/nonexistent/tool"), ["x"], None).await.unwrap_err();
        assert_eq!(err.kind(), tickfy_types::ErrorKind::ExternalTool);
    }
}
