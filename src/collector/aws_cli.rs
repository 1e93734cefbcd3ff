use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::{CollectorConfig, StderrPolicy};
use crate::error::{AuditError, Result};

/// Arguments that enumerate every security group as JSON.
const DESCRIBE_ARGS: [&str; 4] = ["ec2", "describe-security-groups", "--output", "json"];

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Enumerates security groups by shelling out to the cloud CLI.
///
/// Stdout and stderr are captured separately and drained on their own
/// threads, so a large document cannot fill the pipe while we wait. The
/// child is killed when the configured timeout expires. No retries.
pub struct AwsCliCollector {
    config: CollectorConfig,
    base_args: Vec<String>,
}

impl AwsCliCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            base_args: DESCRIBE_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the subcommand arguments. Region and profile flags are still
    /// appended.
    pub fn with_base_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    /// Full argument list passed to the program.
    pub fn args(&self) -> Vec<String> {
        let mut args = self.base_args.clone();
        if let Some(region) = &self.config.region {
            args.push("--region".into());
            args.push(region.clone());
        }
        if let Some(profile) = &self.config.profile {
            args.push("--profile".into());
            args.push(profile.clone());
        }
        args
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

impl super::Collector for AwsCliCollector {
    fn describe(&self) -> String {
        format!("{} {}", self.config.program, self.args().join(" "))
    }

    fn collect(&self) -> Result<String> {
        let program = &self.config.program;

        if self.config.region.is_none() && self.config.profile.is_none() {
            tracing::info!(
                program = %program,
                "no region or profile configured, using the CLI's ambient configuration"
            );
        }
        tracing::info!(command = %self.describe(), "running collector command");

        let mut child = Command::new(program)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AuditError::CommandNotFound(program.clone()),
                _ => AuditError::Collector(format!("failed to spawn {program}: {e}")),
            })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = wait_with_timeout(&mut child, self.timeout())?;

        let stdout = collect_pipe(stdout);
        let stderr = collect_pipe(stderr);
        let stderr = String::from_utf8_lossy(&stderr);

        check_outcome(self.config.stderr_policy, program, status, &stderr)?;

        tracing::info!(bytes = stdout.len(), %status, "collector command finished");
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Decide whether a finished invocation failed under `policy`.
fn check_outcome(
    policy: StderrPolicy,
    program: &str,
    status: ExitStatus,
    stderr: &str,
) -> Result<()> {
    match policy {
        StderrPolicy::Strict => {
            if !stderr.is_empty() {
                return Err(AuditError::Collector(format!(
                    "{program} wrote to stderr: {}",
                    stderr.trim_end()
                )));
            }
        }
        StderrPolicy::ExitStatus => {
            if !status.success() {
                return Err(AuditError::Collector(format!(
                    "{program} exited with {status}: {}",
                    stderr.trim_end()
                )));
            }
            if !stderr.is_empty() {
                tracing::warn!(program, stderr = %stderr.trim_end(), "collector wrote to stderr");
            }
        }
    }
    Ok(())
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect_pipe(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}

/// Wait for a child process, killing it once `timeout` has elapsed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus> {
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(timeout_secs = timeout.as_secs(), "collector timed out, killed");
                    return Err(AuditError::Timeout {
                        secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                return Err(AuditError::Collector(format!(
                    "failed to wait for collector: {e}"
                )));
            }
        }
    }
}
