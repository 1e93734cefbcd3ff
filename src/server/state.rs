use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{ScanOptions, ScanReport};

/// Outcome of a completed run, as returned to HTTP callers.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: String,
    pub scan_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub findings: usize,
    pub high_risk: usize,
    pub allowed: usize,
    pub report_path: Option<PathBuf>,
}

impl From<&ScanReport> for RunSummary {
    fn from(report: &ScanReport) -> Self {
        Self {
            status: "completed".into(),
            scan_id: report.scan_id,
            generated_at: report.generated_at,
            findings: report.verdict.total_findings,
            high_risk: report.verdict.high_risk,
            allowed: report.verdict.allowed,
            report_path: report.report_path.clone(),
        }
    }
}

/// Shared state of the trigger service.
pub struct AppState {
    pub scan_options: ScanOptions,
    /// Directory served for non-API paths.
    pub static_root: PathBuf,
    /// Held by the run itself, not the request, so a dropped client cannot
    /// release it early. At most one run writes the report.
    pub scan_lock: Arc<Mutex<()>>,
    pub last_run: RwLock<Option<RunSummary>>,
}

impl AppState {
    pub fn new(scan_options: ScanOptions, static_root: PathBuf) -> Self {
        Self {
            scan_options,
            static_root,
            scan_lock: Arc::new(Mutex::new(())),
            last_run: RwLock::new(None),
        }
    }
}
