use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, DuplicateKeys, FieldDelta, Subresource, SyncPolicy, UpdateMode};

pub type SecurityGroup = Object<SecurityGroupSpec, SecurityGroupStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupSpec {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub ingress_rules: Vec<IpPermission>,
    #[serde(default)]
    pub egress_rules: Vec<IpPermission>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for SecurityGroupSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "name", &self.name, &other.name);
        delta.compare_field(prefix, "description", &self.description, &other.description);
        delta.compare_field(prefix, "vpcID", &self.vpc_id, &other.vpc_id);
        delta.compare_collection(
            prefix,
            "ingressRules",
            &flatten(&self.ingress_rules),
            &flatten(&other.ingress_rules),
        );
        delta.compare_collection(
            prefix,
            "egressRules",
            &flatten(&self.egress_rules),
            &flatten(&other.egress_rules),
        );
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupStatus {
    pub id: Option<String>,
    pub owner_id: Option<String>,
    #[serde(default)]
    pub rules: Vec<SecurityGroupRule>,
}

/// A single rule as reported by DescribeSecurityGroupRules.
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRule {
    pub security_group_rule_id: Option<String>,
    pub group_id: Option<String>,
    pub is_egress: Option<bool>,
    pub ip_protocol: Option<String>,
    pub from_port: Option<i64>,
    pub to_port: Option<i64>,
    pub cidr_ipv4: Option<String>,
    pub cidr_ipv6: Option<String>,
    pub prefix_list_id: Option<String>,
    pub referenced_group_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IpPermission {
    pub ip_protocol: Option<String>,
    pub from_port: Option<i64>,
    pub to_port: Option<i64>,
    #[serde(default)]
    pub ip_ranges: Vec<IpRange>,
    #[serde(default)]
    pub ipv6_ranges: Vec<Ipv6Range>,
    #[serde(default, rename = "prefixListIDs")]
    pub prefix_list_ids: Vec<PrefixListId>,
    #[serde(default, rename = "userIDGroupPairs")]
    pub user_id_group_pairs: Vec<UserIdGroupPair>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IpRange {
    #[serde(rename = "cidrIP")]
    pub cidr_ip: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ipv6Range {
    #[serde(rename = "cidrIPv6")]
    pub cidr_ipv6: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrefixListId {
    #[serde(rename = "prefixListID")]
    pub prefix_list_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdGroupPair {
    pub description: Option<String>,
    #[serde(rename = "groupID")]
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub peering_status: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
    #[serde(rename = "vpcPeeringConnectionID")]
    pub vpc_peering_connection_id: Option<String>,
}

impl Compare for IpRange {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "cidrIP", &self.cidr_ip, &other.cidr_ip);
        delta.compare_field(prefix, "description", &self.description, &other.description);
    }
}

impl Compare for Ipv6Range {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "cidrIPv6", &self.cidr_ipv6, &other.cidr_ipv6);
        delta.compare_field(prefix, "description", &self.description, &other.description);
    }
}

impl Compare for PrefixListId {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "prefixListID", &self.prefix_list_id, &other.prefix_list_id);
        delta.compare_field(prefix, "description", &self.description, &other.description);
    }
}

impl Compare for UserIdGroupPair {
    // userID, vpcID and peeringStatus are filled in by EC2 and are not compared
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "description", &self.description, &other.description);
        delta.compare_field(prefix, "groupID", &self.group_id, &other.group_id);
        delta.compare_field(
            prefix,
            "vpcPeeringConnectionID",
            &self.vpc_peering_connection_id,
            &other.vpc_peering_connection_id,
        );
    }
}

impl Compare for IpPermission {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "ipProtocol", &self.ip_protocol, &other.ip_protocol);
        delta.compare_field(prefix, "fromPort", &self.from_port, &other.from_port);
        delta.compare_field(prefix, "toPort", &self.to_port, &other.to_port);
        delta.compare_collection(prefix, "ipRanges", &self.ip_ranges, &other.ip_ranges);
        delta.compare_collection(prefix, "ipv6Ranges", &self.ipv6_ranges, &other.ipv6_ranges);
        delta.compare_collection(
            prefix,
            "prefixListIDs",
            &self.prefix_list_ids,
            &other.prefix_list_ids,
        );
        delta.compare_collection(
            prefix,
            "userIDGroupPairs",
            &self.user_id_group_pairs,
            &other.user_id_group_pairs,
        );
    }
}

/// Rules sharing protocol and port range may carry any number of peers, so
/// duplicate keys are expected. A changed rule is revoked and re-authorized.
impl Subresource for IpPermission {
    type Key = (Option<String>, Option<i64>, Option<i64>);
    const KIND: &'static str = "security group rule";
    const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::Replace, DuplicateKeys::Allow);

    fn key(&self) -> Self::Key {
        (self.ip_protocol.clone(), self.from_port, self.to_port)
    }

    fn validate(&self) -> Result<(), String> {
        if self.ip_protocol.is_none() {
            return Err("ipProtocol is required".into());
        }
        if self.peer_count() == 0 {
            return Err(concat!(
                "at least one of ipRanges, ipv6Ranges, prefixListIDs ",
                "or userIDGroupPairs is required"
            )
            .into());
        }
        Ok(())
    }
}

impl IpPermission {
    /// Protocol "-1" means all traffic.
    pub fn all_traffic() -> Self {
        Self {
            ip_protocol: Some("-1".into()),
            from_port: Some(-1),
            to_port: Some(-1),
            ..Default::default()
        }
    }

    /// The egress rule EC2 attaches to every new security group.
    pub fn default_egress() -> Self {
        Self {
            ip_ranges: vec![IpRange {
                cidr_ip: Some("0.0.0.0/0".into()),
                description: None,
            }],
            ..Self::all_traffic()
        }
    }

    fn peer_count(&self) -> usize {
        self.ip_ranges.len()
            + self.ipv6_ranges.len()
            + self.prefix_list_ids.len()
            + self.user_id_group_pairs.len()
    }

    fn without_peers(&self) -> Self {
        Self {
            ip_protocol: self.ip_protocol.clone(),
            from_port: self.from_port,
            to_port: self.to_port,
            ..Default::default()
        }
    }

    /// Split into one permission per peer.
    pub fn flatten(&self) -> Vec<IpPermission> {
        if self.peer_count() <= 1 {
            return vec![self.clone()];
        }
        let mut out = Vec::with_capacity(self.peer_count());
        out.extend(self.ip_ranges.iter().map(|r| IpPermission {
            ip_ranges: vec![r.clone()],
            ..self.without_peers()
        }));
        out.extend(self.ipv6_ranges.iter().map(|r| IpPermission {
            ipv6_ranges: vec![r.clone()],
            ..self.without_peers()
        }));
        out.extend(self.prefix_list_ids.iter().map(|p| IpPermission {
            prefix_list_ids: vec![p.clone()],
            ..self.without_peers()
        }));
        out.extend(self.user_id_group_pairs.iter().map(|p| IpPermission {
            user_id_group_pairs: vec![p.clone()],
            ..self.without_peers()
        }));
        out
    }

    /// Fill in the group and VPC of group pairs that reference neither.
    pub fn with_group_defaults(mut self, group_id: &str, vpc_id: Option<&str>) -> Self {
        for pair in &mut self.user_id_group_pairs {
            if pair.group_id.is_none() && pair.group_name.is_none() {
                pair.group_id = Some(group_id.to_string());
            }
            if pair.vpc_id.is_none() {
                pair.vpc_id = vpc_id.map(str::to_string);
            }
        }
        self
    }
}

pub fn flatten(rules: &[IpPermission]) -> Vec<IpPermission> {
    rules.iter().flat_map(IpPermission::flatten).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcilers::compute_delta;

    fn tcp(port: i64, cidr: &str) -> IpPermission {
        IpPermission {
            ip_protocol: Some("tcp".into()),
            from_port: Some(port),
            to_port: Some(port),
            ip_ranges: vec![IpRange {
                cidr_ip: Some(cidr.into()),
                description: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_rule_scenarios() {
        let cases = vec![
            (vec![tcp(80, "0.0.0.0/0")], vec![], vec![tcp(80, "0.0.0.0/0")], vec![]),
            (vec![], vec![tcp(80, "0.0.0.0/0")], vec![], vec![tcp(80, "0.0.0.0/0")]),
            (vec![tcp(80, "10.0.0.0/8")], vec![tcp(80, "10.0.0.0/8")], vec![], vec![]),
            (
                vec![tcp(22, "0.0.0.0/0"), tcp(443, "0.0.0.0/0")],
                vec![tcp(22, "0.0.0.0/0")],
                vec![tcp(443, "0.0.0.0/0")],
                vec![],
            ),
        ];
        for (desired, latest, to_add, to_delete) in cases {
            let delta = compute_delta(&desired, &latest).unwrap();
            assert_eq!(delta.to_add, to_add);
            assert_eq!(delta.to_delete, to_delete);
            assert!(delta.to_update.is_empty());
        }
    }

    #[test]
    fn test_flatten_splits_peers() {
        let mut rule = tcp(443, "10.0.0.0/8");
        rule.ip_ranges.push(IpRange {
            cidr_ip: Some("192.168.0.0/16".into()),
            description: None,
        });
        rule.user_id_group_pairs.push(UserIdGroupPair {
            group_id: Some("sg-1".into()),
            ..Default::default()
        });
        let flat = rule.flatten();
        assert_eq!(flat.len(), 3);
        assert!(flat.iter().all(|r| r.peer_count() == 1));

        // grouped on one side and split on the other is no change
        let split = vec![tcp(443, "10.0.0.0/8"), tcp(443, "192.168.0.0/16")];
        let mut grouped = tcp(443, "10.0.0.0/8");
        grouped.ip_ranges.push(IpRange {
            cidr_ip: Some("192.168.0.0/16".into()),
            description: None,
        });
        assert!(compute_delta(&flatten(&split), &flatten(&[grouped])).unwrap().is_empty());
    }

    #[test]
    fn test_group_pair_defaults() {
        let rule = IpPermission {
            user_id_group_pairs: vec![UserIdGroupPair::default()],
            ..tcp(5432, "10.0.0.0/8")
        }
        .with_group_defaults("sg-self", Some("vpc-1"));
        assert_eq!(rule.user_id_group_pairs[0].group_id.as_deref(), Some("sg-self"));
        assert_eq!(rule.user_id_group_pairs[0].vpc_id.as_deref(), Some("vpc-1"));
    }

    #[test]
    fn test_server_populated_pair_fields_ignored() {
        let desired = IpPermission {
            ip_protocol: Some("tcp".into()),
            user_id_group_pairs: vec![UserIdGroupPair {
                group_id: Some("sg-1".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut latest = desired.clone();
        latest.user_id_group_pairs[0].user_id = Some("123456789012".into());
        assert!(compute_delta(&[desired], &[latest]).unwrap().is_empty());
    }

    #[test]
    fn test_rule_without_peer_is_invalid() {
        let rule = IpPermission {
            ip_protocol: Some("tcp".into()),
            ..Default::default()
        };
        assert!(compute_delta(&[rule], &[]).is_err());
    }
}
