//! Report sink: persists findings as `<output-dir>/security_analysis.json`.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{AuditError, Result};
use crate::rules::Finding;

pub const REPORT_FILE_NAME: &str = "security_analysis.json";

/// Serialize findings as a 4-space indented JSON array.
pub fn to_report_json(findings: &[Finding]) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    findings.serialize(&mut ser)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes the report file. Every write replaces the previous report whole.
#[derive(Debug, Clone)]
pub struct ReportSink {
    dir: PathBuf,
}

impl ReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE_NAME)
    }

    /// Create the output directory and its parents if absent.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| AuditError::OutputDir {
            path: self.dir.clone(),
            source,
        })?;
        tracing::debug!(dir = %self.dir.display(), "output directory ready");
        Ok(())
    }

    /// Write findings to a temporary file next to the report, then rename it
    /// over the report so readers never observe a partial file.
    pub fn write(&self, findings: &[Finding]) -> Result<PathBuf> {
        let path = self.path();
        let json = to_report_json(findings)?;
        let write_err = |source: std::io::Error| AuditError::Write {
            path: path.clone(),
            source,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".security_analysis.")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Temp files are created 0600. Keep the replaced report's mode,
            // else 0644.
            let mode = std::fs::metadata(&path)
                .map(|meta| meta.permissions().mode() & 0o777)
                .unwrap_or(0o644);
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(mode))
                .map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        tracing::info!(path = %path.display(), findings = findings.len(), "report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Risk;
    use pretty_assertions::assert_eq;

    fn finding(port: &str, risk: Risk) -> Finding {
        Finding {
            security_group_name: Some("web".into()),
            security_group_id: Some("sg-1".into()),
            protocol: Some("tcp".into()),
            port_range: port.into(),
            open_to: "0.0.0.0/0".into(),
            risk,
        }
    }

    #[test]
    fn json_uses_four_space_indent_and_fixed_keys() {
        let json = to_report_json(&[finding("22-22", Risk::HighRisk)]).unwrap();
        let expected = r#"[
    {
        "SecurityGroupName": "web",
        "SecurityGroupId": "sg-1",
        "Protocol": "tcp",
        "PortRange": "22-22",
        "OpenTo": "0.0.0.0/0",
        "Risk": "HIGH RISK"
    }
]"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn empty_report_is_empty_array() {
        assert_eq!(to_report_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(root.path().join("backend").join("data"));
        sink.ensure_dir().unwrap();
        assert!(sink.dir().is_dir());
        // Idempotent.
        sink.ensure_dir().unwrap();
    }

    #[test]
    fn ensure_dir_fails_when_path_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = ReportSink::new(&blocker).ensure_dir().unwrap_err();
        assert!(matches!(err, AuditError::OutputDir { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn write_overwrites_previous_report() {
        let root = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(root.path());
        sink.ensure_dir().unwrap();

        sink.write(&[
            finding("22-22", Risk::HighRisk),
            finding("443-443", Risk::Allowed),
        ])
        .unwrap();
        let path = sink.write(&[finding("80-80", Risk::Allowed)]).unwrap();

        assert_eq!(path, root.path().join(REPORT_FILE_NAME));
        let written: Vec<Finding> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec![finding("80-80", Risk::Allowed)]);
    }

    #[test]
    fn write_leaves_no_temporary_files() {
        let root = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(root.path());
        sink.write(&[finding("22-22", Risk::HighRisk)]).unwrap();

        let names: Vec<String> = std::fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![REPORT_FILE_NAME.to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn new_report_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(root.path());
        let path = sink.write(&[finding("22-22", Risk::HighRisk)]).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_existing_report_mode() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(root.path());
        let path = sink.path();
        std::fs::write(&path, "[]").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        sink.write(&[finding("443-443", Risk::Allowed)]).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn write_into_missing_directory_is_write_error() {
        let root = tempfile::tempdir().unwrap();
        let sink = ReportSink::new(root.path().join("missing"));
        let err = sink.write(&[]).unwrap_err();
        assert!(matches!(err, AuditError::Write { .. }));
        assert_eq!(err.exit_code(), 6);
    }
}
