use serde::{Deserialize, Serialize};

/// One world-exposed ingress rule.
///
/// Field order and key names are the on-disk report contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "SecurityGroupName")]
    pub security_group_name: Option<String>,
    #[serde(rename = "SecurityGroupId")]
    pub security_group_id: Option<String>,
    #[serde(rename = "Protocol")]
    pub protocol: Option<String>,
    /// `"{from}-{to}"`, with `None` for an absent bound.
    #[serde(rename = "PortRange")]
    pub port_range: String,
    #[serde(rename = "OpenTo")]
    pub open_to: String,
    #[serde(rename = "Risk")]
    pub risk: Risk,
}

/// Risk label of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Risk {
    #[serde(rename = "ALLOWED (80/443)")]
    Allowed,
    #[serde(rename = "HIGH RISK")]
    HighRisk,
}

impl Risk {
    pub fn is_high(self) -> bool {
        matches!(self, Self::HighRisk)
    }
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowed => write!(f, "ALLOWED (80/443)"),
            Self::HighRisk => write!(f, "HIGH RISK"),
        }
    }
}
