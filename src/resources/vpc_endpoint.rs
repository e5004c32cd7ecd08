use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Object, Tag};
use crate::reconcilers::{Compare, FieldDelta};

pub const STATE_PENDING: &str = "pending";

pub type VpcEndpoint = Object<VpcEndpointSpec, VpcEndpointStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcEndpointSpec {
    pub service_name: Option<String>,
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
    /// `Interface`, `Gateway` or `GatewayLoadBalancer`
    pub vpc_endpoint_type: Option<String>,
    #[serde(rename = "subnetIDs")]
    pub subnet_ids: Option<Vec<String>>,
    #[serde(rename = "routeTableIDs")]
    pub route_table_ids: Option<Vec<String>>,
    #[serde(rename = "securityGroupIDs")]
    pub security_group_ids: Option<Vec<String>>,
    /// JSON policy document.
    pub policy_document: Option<String>,
    #[serde(rename = "privateDNSEnabled")]
    pub private_dns_enabled: Option<bool>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// EC2 reformats policy documents, so they are compared as JSON values.
fn policy(document: &Option<String>) -> Option<Value> {
    document
        .as_deref()
        .map(|d| serde_json::from_str(d).unwrap_or_else(|_| Value::String(d.to_string())))
}

impl Compare for VpcEndpointSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "serviceName", &self.service_name, &other.service_name);
        delta.compare_field(prefix, "vpcID", &self.vpc_id, &other.vpc_id);
        delta.compare_desired(
            prefix,
            "vpcEndpointType",
            &self.vpc_endpoint_type,
            &other.vpc_endpoint_type,
        );
        delta.compare_desired_set(prefix, "subnetIDs", &self.subnet_ids, &other.subnet_ids);
        delta.compare_desired_set(
            prefix,
            "routeTableIDs",
            &self.route_table_ids,
            &other.route_table_ids,
        );
        delta.compare_desired_set(
            prefix,
            "securityGroupIDs",
            &self.security_group_ids,
            &other.security_group_ids,
        );
        delta.compare_desired(
            prefix,
            "policyDocument",
            &policy(&self.policy_document),
            &policy(&other.policy_document),
        );
        delta.compare_desired(
            prefix,
            "privateDNSEnabled",
            &self.private_dns_enabled,
            &other.private_dns_enabled,
        );
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcEndpointStatus {
    #[serde(rename = "vpcEndpointID")]
    pub id: Option<String>,
    pub owner_id: Option<String>,
    /// `pendingAcceptance`, `pending`, `available`, `deleting`, `deleted`,
    /// `rejected`, `failed` or `expired`
    pub state: Option<String>,
}
