use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, FieldDelta};

pub type Vpc = Object<VpcSpec, VpcStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcSpec {
    /// IPv4 CIDR blocks. The first one is the primary block the VPC is created with.
    #[serde(default, rename = "cidrBlocks")]
    pub cidr_blocks: Vec<String>,
    #[serde(rename = "enableDNSSupport")]
    pub enable_dns_support: Option<bool>,
    #[serde(rename = "enableDNSHostnames")]
    pub enable_dns_hostnames: Option<bool>,
    pub instance_tenancy: Option<String>,
    /// Remove the ingress and egress rules EC2 adds to the VPC's default
    /// security group. Rules are never added back.
    pub disallow_security_group_default_rules: Option<bool>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for VpcSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_set(prefix, "cidrBlocks", &self.cidr_blocks, &other.cidr_blocks);
        delta.compare_desired(
            prefix,
            "enableDNSSupport",
            &self.enable_dns_support,
            &other.enable_dns_support,
        );
        delta.compare_desired(
            prefix,
            "enableDNSHostnames",
            &self.enable_dns_hostnames,
            &other.enable_dns_hostnames,
        );
        delta.compare_desired(
            prefix,
            "instanceTenancy",
            &self.instance_tenancy,
            &other.instance_tenancy,
        );
        delta.compare_desired(
            prefix,
            "disallowSecurityGroupDefaultRules",
            &self.disallow_security_group_default_rules,
            &other.disallow_security_group_default_rules,
        );
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcStatus {
    #[serde(rename = "vpcID")]
    pub id: Option<String>,
    pub owner_id: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "dhcpOptionsID")]
    pub dhcp_options_id: Option<String>,
    pub is_default: Option<bool>,
    #[serde(default, rename = "cidrBlockAssociationSet")]
    pub cidr_block_association_set: Vec<CidrBlockAssociation>,
    pub security_group_default_rules_exist: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CidrBlockAssociation {
    #[serde(rename = "associationID")]
    pub association_id: Option<String>,
    #[serde(rename = "cidrBlock")]
    pub cidr_block: Option<String>,
    /// `associating`, `associated`, `disassociating`, `disassociated`,
    /// `failing` or `failed`
    pub state: Option<String>,
}

impl CidrBlockAssociation {
    /// Blocks on their way out no longer count as part of the VPC.
    pub fn is_associated(&self) -> bool {
        matches!(
            self.state.as_deref(),
            None | Some("associating" | "associated")
        )
    }
}

impl VpcStatus {
    /// The association id of `cidr`, if it is associated.
    pub fn association_id(&self, cidr: &str) -> Option<&str> {
        self.cidr_block_association_set
            .iter()
            .filter(|a| a.is_associated())
            .find(|a| a.cidr_block.as_deref() == Some(cidr))
            .and_then(|a| a.association_id.as_deref())
    }
}
