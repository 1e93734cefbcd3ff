pub mod aws_cli;
pub mod file;

use std::path::PathBuf;

use crate::config::CollectorConfig;
use crate::error::Result;

pub use aws_cli::AwsCliCollector;
pub use file::FileCollector;

/// A collector produces raw `describe-security-groups` JSON text.
///
/// Collectors do not parse; the analyzer owns interpretation of the text.
pub trait Collector: Send + Sync {
    /// Human-readable description of where the data comes from.
    fn describe(&self) -> String;

    /// Fetch the raw document.
    fn collect(&self) -> Result<String>;
}

/// Where a scan reads security-group data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanSource {
    /// Live enumeration through the cloud CLI.
    Cli(CollectorConfig),
    /// A previously captured JSON document.
    File(PathBuf),
}

impl Default for ScanSource {
    fn default() -> Self {
        Self::Cli(CollectorConfig::default())
    }
}

impl ScanSource {
    pub fn collector(&self) -> Box<dyn Collector> {
        match self {
            Self::Cli(config) => Box::new(AwsCliCollector::new(config.clone())),
            Self::File(path) => Box::new(FileCollector::new(path.clone())),
        }
    }
}
