use crate::error::Result;
use crate::rules::{Risk, RULE_ID};
use crate::ScanReport;

use serde_json::{json, Value};

/// Render a run as SARIF 2.1.0.
///
/// Security groups have no source file, so each result carries a logical
/// location named after the group id.
pub fn render(report: &ScanReport) -> Result<String> {
    let results: Vec<Value> = report
        .findings
        .iter()
        .map(|f| {
            let group_id = f.security_group_id.as_deref().unwrap_or("unknown");
            let group_name = f.security_group_name.as_deref().unwrap_or("unknown");
            let protocol = f.protocol.as_deref().unwrap_or("unknown");

            json!({
                "ruleId": RULE_ID,
                "level": risk_to_sarif_level(f.risk),
                "message": {
                    "text": format!(
                        "Security group {} ({}) allows {} {} from {} [{}]",
                        group_name, group_id, protocol, f.port_range, f.open_to, f.risk
                    ),
                },
                "locations": [{
                    "logicalLocations": [{
                        "name": group_id,
                        "fullyQualifiedName": format!("{}/{}", group_id, f.port_range),
                        "kind": "resource",
                    }],
                }],
                "properties": {
                    "risk": f.risk,
                    "protocol": f.protocol,
                    "portRange": f.port_range,
                },
            })
        })
        .collect();

    let sarif = json!({
        "$schema": "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "sg-audit",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": [{
                        "id": RULE_ID,
                        "name": "OpenIngress",
                        "shortDescription": {
                            "text": "Security group ingress open to 0.0.0.0/0",
                        },
                        "help": {
                            "text": "Restrict the source range, or limit world-facing rules to ports 80 and 443.",
                        },
                        "defaultConfiguration": { "level": "error" },
                    }],
                },
            },
            "results": results,
            "automationDetails": {
                "id": format!("sg-audit/{}", report.scan_id),
                "guid": report.scan_id,
            },
            "invocations": [{
                "executionSuccessful": true,
                "endTimeUtc": report.generated_at.to_rfc3339(),
            }],
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn risk_to_sarif_level(risk: Risk) -> &'static str {
    match risk {
        Risk::HighRisk => "error",
        Risk::Allowed => "note",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::policy::Policy;
    use crate::rules::Finding;

    #[test]
    fn levels_follow_risk() {
        let findings = vec![
            Finding {
                security_group_name: Some("web".into()),
                security_group_id: Some("sg-1".into()),
                protocol: Some("tcp".into()),
                port_range: "22-22".into(),
                open_to: "0.0.0.0/0".into(),
                risk: Risk::HighRisk,
            },
            Finding {
                security_group_name: Some("web".into()),
                security_group_id: Some("sg-1".into()),
                protocol: Some("tcp".into()),
                port_range: "443-443".into(),
                open_to: "0.0.0.0/0".into(),
                risk: Risk::Allowed,
            },
        ];
        let report = ScanReport::new("test".into(), findings, &Policy::default());
        let sarif: Value = serde_json::from_str(&render(&report).unwrap()).unwrap();

        let results = sarif["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["level"], "error");
        assert_eq!(results[1]["level"], "note");
        assert_eq!(results[0]["ruleId"], RULE_ID);
        assert_eq!(results[1]["properties"]["risk"], "ALLOWED (80/443)");
        assert_eq!(
            results[0]["message"]["text"],
            "Security group web (sg-1) allows tcp 22-22 from 0.0.0.0/0 [HIGH RISK]"
        );
        assert_eq!(sarif["version"], "2.1.0");
    }
}
