use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, DuplicateKeys, FieldDelta, Subresource, SyncPolicy, UpdateMode};

/// Rule number of the implicit deny-all entry present in every network ACL.
pub const DEFAULT_RULE_NUMBER: i64 = 32767;

pub type NetworkAcl = Object<NetworkAclSpec, NetworkAclStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAclSpec {
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub entries: Vec<NetworkAclEntry>,
    #[serde(default)]
    pub associations: Vec<NetworkAclAssociation>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for NetworkAclSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "vpcID", &self.vpc_id, &other.vpc_id);
        let entries = |e: &[NetworkAclEntry]| -> Vec<NetworkAclEntry> {
            e.iter().filter(|e| !e.is_default()).cloned().collect()
        };
        let (a, b) = (entries(&self.entries), entries(&other.entries));
        delta.compare_collection(prefix, "entries", &a, &b);
        let (a, b) = (subnets(&self.associations), subnets(&other.associations));
        delta.compare_set(prefix, "associations", &a, &b);
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

fn subnets(associations: &[NetworkAclAssociation]) -> Vec<&str> {
    associations
        .iter()
        .filter_map(|a| a.subnet_id.as_deref())
        .collect()
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAclStatus {
    pub id: Option<String>,
    pub owner_id: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAclEntry {
    pub cidr_block: Option<String>,
    pub egress: Option<bool>,
    pub icmp_type_code: Option<IcmpTypeCode>,
    pub ipv6_cidr_block: Option<String>,
    pub port_range: Option<PortRange>,
    pub protocol: Option<String>,
    pub rule_action: Option<String>,
    pub rule_number: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IcmpTypeCode {
    pub code: Option<i64>,
    #[serde(rename = "type")]
    pub type_: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAclAssociation {
    #[serde(rename = "networkACLAssociationID")]
    pub network_acl_association_id: Option<String>,
    #[serde(rename = "networkACLID")]
    pub network_acl_id: Option<String>,
    #[serde(rename = "subnetID")]
    pub subnet_id: Option<String>,
}

impl Compare for IcmpTypeCode {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "code", &self.code, &other.code);
        delta.compare_field(prefix, "type", &self.type_, &other.type_);
    }
}

impl Compare for PortRange {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "from", &self.from, &other.from);
        delta.compare_field(prefix, "to", &self.to, &other.to);
    }
}

impl Compare for NetworkAclEntry {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "cidrBlock", &self.cidr_block, &other.cidr_block);
        delta.compare_field(prefix, "egress", &self.egress(), &other.egress());
        delta.compare_nested(prefix, "icmpTypeCode", &self.icmp_type_code, &other.icmp_type_code);
        delta.compare_field(prefix, "ipv6CIDRBlock", &self.ipv6_cidr_block, &other.ipv6_cidr_block);
        delta.compare_nested(prefix, "portRange", &self.port_range, &other.port_range);
        delta.compare_field(prefix, "protocol", &self.protocol, &other.protocol);
        delta.compare_ignore_case(prefix, "ruleAction", &self.rule_action, &other.rule_action);
        delta.compare_field(prefix, "ruleNumber", &self.rule_number, &other.rule_number);
    }
}

impl NetworkAclEntry {
    pub fn egress(&self) -> bool {
        self.egress.unwrap_or_default()
    }
}

/// Entries are identified by direction and rule number; EC2 replaces an
/// entry in place and never allows two entries under the same key.
impl Subresource for NetworkAclEntry {
    type Key = (bool, i64);
    const KIND: &'static str = "network ACL entry";
    const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::InPlace, DuplicateKeys::Reject);

    fn key(&self) -> (bool, i64) {
        (self.egress(), self.rule_number.unwrap_or_default())
    }

    fn is_default(&self) -> bool {
        self.rule_number == Some(DEFAULT_RULE_NUMBER)
    }

    fn validate(&self) -> Result<(), String> {
        match self.rule_number {
            Some(n) if (1..DEFAULT_RULE_NUMBER).contains(&n) => Ok(()),
            Some(n) => Err(format!("ruleNumber {n} is outside 1..32766")),
            None => Err("ruleNumber is required".into()),
        }
    }
}

impl Compare for NetworkAclAssociation {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(
            prefix,
            "networkACLAssociationID",
            &self.network_acl_association_id,
            &other.network_acl_association_id,
        );
        delta.compare_field(prefix, "networkACLID", &self.network_acl_id, &other.network_acl_id);
        delta.compare_field(prefix, "subnetID", &self.subnet_id, &other.subnet_id);
    }
}

/// An association is the subnet it covers; its identifiers are assigned by EC2.
impl Subresource for NetworkAclAssociation {
    type Key = String;
    const KIND: &'static str = "network ACL association";
    const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::Replace, DuplicateKeys::Reject);
    const IGNORED_FIELDS: &'static [&'static str] = &["networkACLAssociationID", "networkACLID"];

    fn key(&self) -> String {
        self.subnet_id.clone().unwrap_or_default()
    }

    fn validate(&self) -> Result<(), String> {
        match self.subnet_id.as_deref() {
            Some(s) if !s.is_empty() => Ok(()),
            _ => Err("subnetID is required".into()),
        }
    }
}
