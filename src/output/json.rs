use crate::error::Result;
use crate::report::to_report_json;
use crate::rules::Finding;

/// Render findings exactly as they are written to the report file.
pub fn render(findings: &[Finding]) -> Result<String> {
    let mut json = to_report_json(findings)?;
    json.push('\n');
    Ok(json)
}
