use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Collector error: {0}")]
    Collector(String),

    #[error("Collector timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("JSON parsing failed: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to write report {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AuditError {
    /// Process exit code for this error. Each failure class gets its own
    /// code so wrappers can tell a setup problem from a bad collector run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::OutputDir { .. } => 3,
            Self::CommandNotFound(_) | Self::Collector(_) | Self::Timeout { .. } => 4,
            Self::Parse(_) => 5,
            Self::Write { .. } => 6,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Toml(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_classes_have_distinct_exit_codes() {
        let setup = AuditError::OutputDir {
            path: PathBuf::from("data"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let collector = AuditError::Collector("boom".into());
        let parse = AuditError::Parse(serde_json::from_str::<u8>("{").unwrap_err());
        let write = AuditError::Write {
            path: PathBuf::from("data/security_analysis.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };

        let codes = [
            setup.exit_code(),
            collector.exit_code(),
            parse.exit_code(),
            write.exit_code(),
        ];
        assert_eq!(codes, [3, 4, 5, 6]);
        assert!(codes.iter().all(|&c| c != 0));
    }

    #[test]
    fn timeout_counts_as_collector_failure() {
        assert_eq!(AuditError::Timeout { secs: 5 }.exit_code(), 4);
        assert_eq!(AuditError::CommandNotFound("aws".into()).exit_code(), 4);
    }
}
