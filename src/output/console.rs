use crate::rules::{Finding, Risk};
use crate::ScanReport;

/// Render a run as plain console output, high-risk findings first.
pub fn render(report: &ScanReport) -> String {
    let mut output = String::new();
    let findings = &report.findings;

    output.push_str(&format!("\n  Source: {}\n", report.source));

    if findings.is_empty() {
        output.push_str("\n  No security groups open to 0.0.0.0/0.\n\n");
        return output;
    }

    // Stable sort keeps document order within each risk level
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by(|a, b| b.risk.cmp(&a.risk));

    output.push_str(&format!(
        "\n  {} rule(s) open to 0.0.0.0/0:\n\n",
        findings.len()
    ));

    for finding in &sorted {
        let tag = match finding.risk {
            Risk::HighRisk => "[HIGH RISK]",
            Risk::Allowed => "[ALLOWED]  ",
        };

        output.push_str(&format!(
            "  {} {} ({}) {} {}\n",
            tag,
            finding.security_group_name.as_deref().unwrap_or("-"),
            finding.security_group_id.as_deref().unwrap_or("-"),
            finding.protocol.as_deref().unwrap_or("-"),
            finding.port_range,
        ));
    }

    let verdict = &report.verdict;
    let status = if verdict.pass { "PASS" } else { "FAIL" };
    output.push_str(&format!(
        "\n  Result: {} ({} high risk, {} allowed)\n",
        status, verdict.high_risk, verdict.allowed,
    ));
    if let Some(path) = &report.report_path {
        output.push_str(&format!("  Report: {}\n", path.display()));
    }
    output.push('\n');

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::policy::Policy;

    fn finding(name: &str, risk: Risk) -> Finding {
        Finding {
            security_group_name: Some(name.into()),
            security_group_id: None,
            protocol: Some("tcp".into()),
            port_range: "443-443".into(),
            open_to: "0.0.0.0/0".into(),
            risk,
        }
    }

    #[test]
    fn high_risk_listed_first() {
        let findings = vec![finding("web", Risk::Allowed), finding("ssh", Risk::HighRisk)];
        let report = ScanReport::new("test".into(), findings, &Policy::default());
        let out = render(&report);

        let ssh = out.find("ssh").unwrap();
        let web = out.find("web").unwrap();
        assert!(ssh < web);
        assert!(out.contains("1 high risk, 1 allowed"));
        assert!(out.contains("web (-)"));
    }

    #[test]
    fn empty_run_says_so() {
        let report = ScanReport::new("test".into(), vec![], &Policy::default());
        assert!(render(&report).contains("No security groups open"));
    }
}
