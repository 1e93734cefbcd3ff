//! sg-audit: security-group exposure auditor.
//!
//! Enumerates security groups through the cloud CLI, flags every ingress
//! rule open to `0.0.0.0/0`, classifies it as allowed (start port 80/443)
//! or high risk, and writes the findings to `security_analysis.json`.
//!
//! # Quick Start
//!
//! ```no_run
//! use sgaudit::{scan, ScanOptions};
//!
//! let options = ScanOptions::default();
//! let report = scan(&options).unwrap();
//! println!("High risk: {}, Findings: {}", report.verdict.high_risk, report.findings.len());
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod ir;
pub mod output;
pub mod report;
pub mod rules;
pub mod server;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use collector::ScanSource;
use config::Config;
use error::Result;
use output::OutputFormat;
use report::ReportSink;
use rules::policy::{Policy, Verdict};
use rules::Finding;

/// Options for a scan invocation.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Where security-group data comes from.
    pub source: ScanSource,
    /// Directory that receives `security_analysis.json`.
    pub output_dir: PathBuf,
    pub policy: Policy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source: ScanSource::Cli(config.collector.clone()),
            output_dir: config.report.output_dir.clone(),
            policy: config.policy.clone(),
        }
    }
}

/// Complete result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Description of the collector that produced the data.
    pub source: String,
    pub findings: Vec<Finding>,
    pub verdict: Verdict,
    /// Set once the report file has been written.
    pub report_path: Option<PathBuf>,
}

impl ScanReport {
    pub fn new(source: String, findings: Vec<Finding>, policy: &Policy) -> Self {
        let verdict = policy.evaluate(&findings);
        Self {
            scan_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            source,
            findings,
            verdict,
            report_path: None,
        }
    }
}

/// Run a complete scan: prepare the output directory, collect, parse,
/// analyze, and write the report.
///
/// Nothing is written unless collection and parsing both succeed, so a
/// failed run leaves any previous report in place.
pub fn scan(options: &ScanOptions) -> Result<ScanReport> {
    let sink = ReportSink::new(&options.output_dir);
    sink.ensure_dir()?;

    let collector = options.source.collector();
    let source = collector.describe();
    let raw = collector.collect()?;

    tracing::debug!(bytes = raw.len(), "parsing collector output");
    let doc = ir::parse_document(&raw)?;
    let findings = rules::analyze(&doc);
    tracing::info!(
        groups = doc.security_groups.len(),
        findings = findings.len(),
        "found public rules"
    );

    let path = sink.write(&findings)?;

    let mut report = ScanReport::new(source, findings, &options.policy);
    report.report_path = Some(path);
    Ok(report)
}

/// Render a scan report in the specified format.
pub fn render_report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}
