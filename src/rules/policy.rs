use serde::{Deserialize, Serialize};

use super::{Finding, Risk};

/// Summary of a run: counts per risk plus the pass/fail decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub pass: bool,
    pub total_findings: usize,
    pub high_risk: usize,
    pub allowed: usize,
    pub highest_risk: Option<Risk>,
}

/// Policy configuration loaded from `.sgaudit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Fail the run (exit 1) when any high-risk finding exists.
    #[serde(default)]
    pub fail_on_high_risk: bool,
}

impl Policy {
    /// Evaluate findings against this policy and produce a verdict.
    pub fn evaluate(&self, findings: &[Finding]) -> Verdict {
        let high_risk = findings.iter().filter(|f| f.risk.is_high()).count();
        let allowed = findings.len() - high_risk;

        Verdict {
            pass: !(self.fail_on_high_risk && high_risk > 0),
            total_findings: findings.len(),
            high_risk,
            allowed,
            highest_risk: findings.iter().map(|f| f.risk).max(),
        }
    }
}
