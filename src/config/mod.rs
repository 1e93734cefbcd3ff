use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};
use crate::rules::policy::Policy;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".sgaudit.toml";

/// Top-level configuration from `.sgaudit.toml`.
///
/// Precedence, highest first: CLI flag, environment variable, this file,
/// built-in default. The CLI layer applies the first two on top of a loaded
/// `Config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub server: ServerConfig,
}

/// How the cloud CLI is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_program")]
    pub program: String,
    /// Passed as `--region`; unset leaves resolution to the CLI.
    #[serde(default)]
    pub region: Option<String>,
    /// Passed as `--profile`; unset leaves resolution to the CLI.
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub stderr_policy: StderrPolicy,
}

fn default_program() -> String {
    "aws".into()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            region: None,
            profile: None,
            timeout_secs: default_timeout_secs(),
            stderr_policy: StderrPolicy::default(),
        }
    }
}

/// What counts as a failed CLI invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StderrPolicy {
    /// Any output on stderr is fatal; the exit status is not consulted.
    #[default]
    Strict,
    /// A non-zero exit status is fatal; stderr on success is only logged.
    ExitStatus,
}

impl StderrPolicy {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "exit-status" | "exit_status" | "status" => Some(Self::ExitStatus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("backend/data")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for every path other than the API routes.
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8000
}

fn default_static_root() -> PathBuf {
    PathBuf::from(".")
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            static_root: default_static_root(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.collector.program.trim().is_empty() {
            return Err(AuditError::Config("collector.program must not be empty".into()));
        }
        if self.collector.timeout_secs == 0 {
            return Err(AuditError::Config(
                "collector.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# sg-audit configuration
# CLI flags and SGAUDIT_* environment variables override these values.

[collector]
# Cloud CLI executable.
program = "aws"
# Explicit region and profile. When unset the CLI resolves them itself.
# region = "us-east-1"
# profile = "default"
# Kill the CLI after this many seconds.
timeout_secs = 120
# "strict": any stderr output fails the run.
# "exit-status": only a non-zero exit status fails the run.
stderr_policy = "strict"

[report]
# security_analysis.json is written here.
output_dir = "backend/data"

[policy]
# Exit with status 1 when a HIGH RISK finding exists.
fail_on_high_risk = false

[server]
bind = "127.0.0.1"
port = 8000
static_root = "."
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.collector, CollectorConfig::default());
        assert_eq!(config.report.output_dir, PathBuf::from("backend/data"));
        assert_eq!(config.server.listen_addr().port(), 8000);
        // Relative to the served root, so the report is at /backend/data/.
        assert_eq!(config.server.static_root, PathBuf::from("."));
        assert!(!config.policy.fail_on_high_risk);
    }

    #[test]
    fn starter_toml_round_trips_to_defaults() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert_eq!(config.collector, CollectorConfig::default());
        assert_eq!(config.report, ReportConfig::default());
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "[collector]\nregion = \"eu-west-1\"\nstderr_policy = \"exit-status\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.collector.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.collector.stderr_policy, StderrPolicy::ExitStatus);
        assert_eq!(config.collector.program, "aws");
        assert_eq!(
            Duration::from_secs(config.collector.timeout_secs),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[collector]\ntimeout_secs = 0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn stderr_policy_lenient_parse() {
        assert_eq!(
            StderrPolicy::from_str_lenient("Strict"),
            Some(StderrPolicy::Strict)
        );
        assert_eq!(
            StderrPolicy::from_str_lenient("exit_status"),
            Some(StderrPolicy::ExitStatus)
        );
        assert_eq!(StderrPolicy::from_str_lenient("lenient"), None);
    }
}
