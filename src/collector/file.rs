use std::path::PathBuf;

use crate::error::Result;

/// Reads a captured `describe-security-groups` document from disk, for
/// offline analysis.
pub struct FileCollector {
    path: PathBuf,
}

impl FileCollector {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl super::Collector for FileCollector {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn collect(&self) -> Result<String> {
        tracing::debug!(path = %self.path.display(), "reading captured document");
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use crate::error::AuditError;

    #[test]
    fn reads_file_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.json");
        std::fs::write(&path, r#"{"SecurityGroups": []}"#).unwrap();

        let collector = FileCollector::new(path.clone());
        assert_eq!(collector.collect().unwrap(), r#"{"SecurityGroups": []}"#);
        assert!(collector.describe().contains("groups.json"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let collector = FileCollector::new(PathBuf::from("no/such/file.json"));
        assert!(matches!(collector.collect().unwrap_err(), AuditError::Io(_)));
    }
}
