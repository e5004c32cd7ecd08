use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, FieldDelta};

pub const SERVICE_STATE_AVAILABLE: &str = "Available";

pub type VpcEndpointServiceConfiguration =
    Object<VpcEndpointServiceConfigurationSpec, VpcEndpointServiceConfigurationStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcEndpointServiceConfigurationSpec {
    pub acceptance_required: Option<bool>,
    #[serde(rename = "gatewayLoadBalancerARNs")]
    pub gateway_load_balancer_arns: Option<Vec<String>>,
    #[serde(rename = "networkLoadBalancerARNs")]
    pub network_load_balancer_arns: Option<Vec<String>>,
    /// An empty name removes the one EC2 holds.
    pub private_dns_name: Option<String>,
    pub supported_ip_address_types: Option<Vec<String>>,
    /// Principal ARNs allowed to create endpoints to this service.
    #[serde(default)]
    pub allowed_principals: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Fields left unset are not managed and keep whatever EC2 reports.
impl Compare for VpcEndpointServiceConfigurationSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_desired(
            prefix,
            "acceptanceRequired",
            &self.acceptance_required,
            &other.acceptance_required,
        );
        delta.compare_desired_set(
            prefix,
            "gatewayLoadBalancerARNs",
            &self.gateway_load_balancer_arns,
            &other.gateway_load_balancer_arns,
        );
        delta.compare_desired_set(
            prefix,
            "networkLoadBalancerARNs",
            &self.network_load_balancer_arns,
            &other.network_load_balancer_arns,
        );
        delta.compare_desired(
            prefix,
            "privateDNSName",
            &self.private_dns_name.as_deref(),
            &Some(other.private_dns_name.as_deref().unwrap_or_default()),
        );
        delta.compare_desired_set(
            prefix,
            "supportedIPAddressTypes",
            &self.supported_ip_address_types,
            &other.supported_ip_address_types,
        );
        delta.compare_set(
            prefix,
            "allowedPrincipals",
            &self.allowed_principals,
            &other.allowed_principals,
        );
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcEndpointServiceConfigurationStatus {
    #[serde(rename = "serviceID")]
    pub id: Option<String>,
    pub service_name: Option<String>,
    /// `Pending`, `Available`, `Deleting`, `Deleted` or `Failed`
    pub service_state: Option<String>,
}
