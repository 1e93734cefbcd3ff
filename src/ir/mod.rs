//! Intermediate representation of `describe-security-groups` output.
//!
//! Every collector produces raw JSON in the cloud CLI's shape; the analyzer
//! only ever sees these types. Missing keys and explicit `null`s are replaced
//! by empty defaults at every level, so a sparse document yields fewer
//! findings instead of a parse failure.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AuditError, Result};

/// The CIDR that denotes "any IPv4 source".
pub const UNIVERSAL_CIDR: &str = "0.0.0.0/0";

/// Top-level document returned by `aws ec2 describe-security-groups`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupsDocument {
    #[serde(
        rename = "SecurityGroups",
        default,
        deserialize_with = "null_as_default"
    )]
    pub security_groups: Vec<SecurityGroup>,
}

/// A security group snapshot. Not persisted; sourced fresh on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(rename = "GroupName", default)]
    pub group_name: Option<String>,
    #[serde(rename = "GroupId", default)]
    pub group_id: Option<String>,
    #[serde(
        rename = "IpPermissions",
        default,
        deserialize_with = "null_as_default"
    )]
    pub ip_permissions: Vec<IngressPermission>,
}

/// One inbound rule of a security group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressPermission {
    #[serde(rename = "IpProtocol", default)]
    pub ip_protocol: Option<String>,
    /// Absent for protocol-level rules such as "all traffic".
    #[serde(rename = "FromPort", default)]
    pub from_port: Option<i64>,
    #[serde(rename = "ToPort", default)]
    pub to_port: Option<i64>,
    #[serde(rename = "IpRanges", default, deserialize_with = "null_as_default")]
    pub ip_ranges: Vec<SourceRange>,
}

impl IngressPermission {
    /// Source ranges equal to the universal CIDR, in document order.
    pub fn universal_ranges(&self) -> impl Iterator<Item = &SourceRange> {
        self.ip_ranges.iter().filter(|r| r.is_universal())
    }
}

/// An IPv4 source range of an ingress permission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    #[serde(rename = "CidrIp", default)]
    pub cidr_ip: Option<String>,
}

impl SourceRange {
    pub fn is_universal(&self) -> bool {
        self.cidr_ip.as_deref() == Some(UNIVERSAL_CIDR)
    }
}

/// Parse collector output. Anything that is not a JSON object is rejected.
///
/// The top level is checked before the typed decode: serde accepts a JSON
/// array as a struct in sequence form, so `[]` would otherwise parse as an
/// empty document and replace a good report with an empty one.
pub fn parse_document(raw: &str) -> Result<SecurityGroupsDocument> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(AuditError::Parse)?;
    if !value.is_object() {
        return Err(AuditError::Parse(serde::de::Error::custom(
            "expected a JSON object with a SecurityGroups key at the top level",
        )));
    }
    serde_json::from_value(value).map_err(AuditError::Parse)
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
