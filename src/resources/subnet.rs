use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::route_table::RouteTableAssociation;
use super::{Object, Tag};
use crate::reconcilers::{Compare, FieldDelta};

pub type Subnet = Object<SubnetSpec, SubnetStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    pub availability_zone: Option<String>,
    pub cidr_block: Option<String>,
    #[serde(rename = "ipv6CIDRBlock")]
    pub ipv6_cidr_block: Option<String>,
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
    #[serde(rename = "mapPublicIPOnLaunch")]
    pub map_public_ip_on_launch: Option<bool>,
    #[serde(rename = "assignIPv6AddressOnCreation")]
    pub assign_ipv6_address_on_creation: Option<bool>,
    /// Route tables explicitly associated with the subnet.
    pub route_tables: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for SubnetSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        // EC2 picks the zone when none is asked for
        delta.compare_desired(
            prefix,
            "availabilityZone",
            &self.availability_zone,
            &other.availability_zone,
        );
        delta.compare_field(prefix, "cidrBlock", &self.cidr_block, &other.cidr_block);
        delta.compare_desired(
            prefix,
            "ipv6CIDRBlock",
            &self.ipv6_cidr_block,
            &other.ipv6_cidr_block,
        );
        delta.compare_field(prefix, "vpcID", &self.vpc_id, &other.vpc_id);
        delta.compare_desired(
            prefix,
            "mapPublicIPOnLaunch",
            &self.map_public_ip_on_launch,
            &other.map_public_ip_on_launch,
        );
        delta.compare_desired(
            prefix,
            "assignIPv6AddressOnCreation",
            &self.assign_ipv6_address_on_creation,
            &other.assign_ipv6_address_on_creation,
        );
        delta.compare_desired_set(prefix, "routeTables", &self.route_tables, &other.route_tables);
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetStatus {
    #[serde(rename = "subnetID")]
    pub id: Option<String>,
    pub owner_id: Option<String>,
    pub state: Option<String>,
    pub available_ip_address_count: Option<i64>,
    #[serde(default)]
    pub route_table_associations: Vec<RouteTableAssociation>,
}
