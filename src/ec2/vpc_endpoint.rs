use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateVpcEndpointInput {
    pub service_name: Option<String>,
    pub vpc_id: Option<String>,
    pub vpc_endpoint_type: Option<String>,
    pub subnet_ids: Vec<String>,
    pub route_table_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub policy_document: Option<String>,
    pub private_dns_enabled: Option<bool>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VpcEndpointDescription {
    pub vpc_endpoint_id: String,
    pub vpc_endpoint_type: Option<String>,
    pub vpc_id: Option<String>,
    pub service_name: Option<String>,
    pub owner_id: Option<String>,
    pub state: Option<String>,
    pub subnet_ids: Vec<String>,
    pub route_table_ids: Vec<String>,
    /// Group ids of the endpoint's network interfaces.
    pub security_group_ids: Vec<String>,
    pub policy_document: Option<String>,
    pub private_dns_enabled: Option<bool>,
    pub tags: Vec<Tag>,
}

/// One call adds and removes subnets, route tables and security groups, and
/// replaces the policy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyVpcEndpointInput {
    pub vpc_endpoint_id: String,
    pub add_subnet_ids: Vec<String>,
    pub remove_subnet_ids: Vec<String>,
    pub add_route_table_ids: Vec<String>,
    pub remove_route_table_ids: Vec<String>,
    pub add_security_group_ids: Vec<String>,
    pub remove_security_group_ids: Vec<String>,
    pub policy_document: Option<String>,
    pub private_dns_enabled: Option<bool>,
}

impl ModifyVpcEndpointInput {
    pub fn is_empty(&self) -> bool {
        self.add_subnet_ids.is_empty()
            && self.remove_subnet_ids.is_empty()
            && self.add_route_table_ids.is_empty()
            && self.remove_route_table_ids.is_empty()
            && self.add_security_group_ids.is_empty()
            && self.remove_security_group_ids.is_empty()
            && self.policy_document.is_none()
            && self.private_dns_enabled.is_none()
    }
}

#[async_trait]
pub trait VpcEndpointApi: Send + Sync {
    async fn create_vpc_endpoint(
        &self,
        input: CreateVpcEndpointInput,
    ) -> Result<VpcEndpointDescription, ApiError>;
    async fn describe_vpc_endpoints(
        &self,
        vpc_endpoint_ids: Vec<String>,
    ) -> Result<Vec<VpcEndpointDescription>, ApiError>;
    async fn modify_vpc_endpoint(&self, input: ModifyVpcEndpointInput) -> Result<(), ApiError>;
    async fn delete_vpc_endpoints(&self, vpc_endpoint_ids: Vec<String>) -> Result<(), ApiError>;
}
