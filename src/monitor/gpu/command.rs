use crate::error::SampleError;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs an external tool to completion and returns its stdout.
///
/// The child is killed if `timeout` expires or the returned future is dropped,
/// so a cancelled poller never leaves a tool running behind it.
pub async fn run_tool(
    tool: &str,
    args: &[&str],
    timeout: Duration,
    hint: Option<&str>,
) -> Result<String, SampleError> {
    let mut cmd = Command::new(tool);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|err| spawn_error(tool, err, hint))?;
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|err| SampleError::tool_failed(tool, err.to_string()))?,
        Err(_) => {
            return Err(SampleError::Timeout {
                tool: tool.to_string(),
                after: timeout,
            })
        }
    };

    if !output.status.success() {
        // some tools report on stdout even when failing
        let reason = match first_line(&output.stderr).or_else(|| first_line(&output.stdout)) {
            Some(line) => format!("{}: {line}", output.status),
            None => output.status.to_string(),
        };
        return Err(SampleError::tool_failed(tool, reason));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!(tool, bytes = stdout.len(), "tool finished");
    Ok(stdout)
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

fn spawn_error(tool: &str, err: io::Error, hint: Option<&str>) -> SampleError {
    match err.kind() {
        io::ErrorKind::NotFound => SampleError::ToolNotFound {
            tool: tool.to_string(),
            hint: hint.map(str::to_string),
        },
        _ => SampleError::tool_failed(tool, format!("spawn failed: {err}")),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_tool_not_found() {
        let err = run_tool(
            "definitely-not-an-installed-tool-7d1c",
            &[],
            Duration::from_secs(1),
            Some("install it"),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            SampleError::ToolNotFound {
                tool: "definitely-not-an-installed-tool-7d1c".into(),
                hint: Some("install it".into()),
            }
        );
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let err = run_tool("sleep", &["5"], Duration::from_millis(50), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SampleError::Timeout { ref tool, .. } if tool == "sleep"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn nonzero_exit_is_execution_failure() {
        let err = run_tool("sh", &["-c", "echo broken >&2; exit 3"], Duration::from_secs(5), None)
            .await
            .unwrap_err();
        match err {
            SampleError::ToolExecutionFailed { tool, reason } => {
                assert_eq!(tool, "sh");
                assert!(reason.contains("broken"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_without_stderr_reports_stdout() {
        let err = run_tool(
            "sh",
            &["-c", "echo 'No devices were found'; exit 6"],
            Duration::from_secs(5),
            None,
        )
        .await
        .unwrap_err();
        match err {
            SampleError::ToolExecutionFailed { reason, .. } => {
                assert!(reason.ends_with(": No devices were found"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropping_the_call_kills_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
        let args = ["-c", script.as_str()];
        let call = run_tool("sh", &args, Duration::from_secs(60), None);
        // the outer timeout drops the in-flight call
        let outcome = tokio::time::timeout(Duration::from_millis(500), call).await;
        assert!(outcome.is_err());

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        let mut alive = true;
        for _ in 0..40 {
            let ps = std::process::Command::new("ps")
                .args(["-o", "stat=", "-p", &pid])
                .output()
                .unwrap();
            let stat = String::from_utf8_lossy(&ps.stdout).trim().to_string();
            // gone, or a zombie waiting to be reaped
            if stat.is_empty() || stat.starts_with('Z') {
                alive = false;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!alive, "child {pid} still running");
    }

    #[tokio::test]
    async fn returns_stdout() {
        let out = run_tool("sh", &["-c", "printf 'a,b\\n1,2\\n'"], Duration::from_secs(5), None)
            .await
            .unwrap();
        assert_eq!(out, "a,b\n1,2\n");
    }
}
