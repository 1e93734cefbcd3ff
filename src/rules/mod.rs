pub mod finding;
pub mod policy;

use crate::ir::{SecurityGroupsDocument, UNIVERSAL_CIDR};

pub use finding::{Finding, Risk};

/// Start ports that are expected to face the internet.
pub const ALLOWED_PORTS: [i64; 2] = [80, 443];

/// Rule identifier used in SARIF output.
pub const RULE_ID: &str = "SG-OPEN-INGRESS";

/// Walk groups → permissions → ranges and emit one finding per range equal
/// to the universal CIDR, in document order. Duplicates are kept.
pub fn analyze(doc: &SecurityGroupsDocument) -> Vec<Finding> {
    let mut findings = Vec::new();

    for group in &doc.security_groups {
        for perm in &group.ip_permissions {
            for _range in perm.universal_ranges() {
                findings.push(Finding {
                    security_group_name: group.group_name.clone(),
                    security_group_id: group.group_id.clone(),
                    protocol: perm.ip_protocol.clone(),
                    port_range: format_port_range(perm.from_port, perm.to_port),
                    open_to: UNIVERSAL_CIDR.into(),
                    risk: classify_risk(perm.from_port),
                });
            }
        }
    }

    findings
}

/// Classify by start port only. A rule with no start port ("all traffic")
/// is never on the allow-list.
pub fn classify_risk(from_port: Option<i64>) -> Risk {
    match from_port {
        Some(port) if ALLOWED_PORTS.contains(&port) => Risk::Allowed,
        _ => Risk::HighRisk,
    }
}

/// Render `"{from}-{to}"`, writing `None` for an absent bound.
pub fn format_port_range(from_port: Option<i64>, to_port: Option<i64>) -> String {
    format!("{}-{}", render_port(from_port), render_port(to_port))
}

fn render_port(port: Option<i64>) -> String {
    port.map(|p| p.to_string()).unwrap_or_else(|| "None".into())
}
