use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, FieldDelta};

/// Associating this identifier detaches any DHCP options set from a VPC.
pub const DEFAULT_DHCP_OPTIONS: &str = "default";

pub type DhcpOptions = Object<DhcpOptionsSpec, DhcpOptionsStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DhcpOptionsSpec {
    #[serde(default)]
    pub dhcp_configurations: Vec<DhcpConfiguration>,
    /// VPCs that use this options set.
    #[serde(default)]
    pub vpc: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for DhcpOptionsSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_collection(
            prefix,
            "dhcpConfigurations",
            &self.dhcp_configurations,
            &other.dhcp_configurations,
        );
        delta.compare_set(prefix, "vpc", &self.vpc, &other.vpc);
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DhcpOptionsStatus {
    #[serde(rename = "dhcpOptionsID")]
    pub id: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DhcpConfiguration {
    pub key: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Compare for DhcpConfiguration {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "key", &self.key, &other.key);
        delta.compare_set(prefix, "values", &self.values, &other.values);
    }
}
