use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateVpcEndpointServiceConfigurationInput {
    pub acceptance_required: Option<bool>,
    pub gateway_load_balancer_arns: Vec<String>,
    pub network_load_balancer_arns: Vec<String>,
    pub private_dns_name: Option<String>,
    pub supported_ip_address_types: Vec<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceConfigurationDescription {
    pub service_id: String,
    pub service_name: Option<String>,
    pub service_state: Option<String>,
    pub acceptance_required: Option<bool>,
    pub gateway_load_balancer_arns: Vec<String>,
    pub network_load_balancer_arns: Vec<String>,
    pub private_dns_name: Option<String>,
    pub supported_ip_address_types: Vec<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyVpcEndpointServiceConfigurationInput {
    pub service_id: String,
    pub acceptance_required: Option<bool>,
    pub private_dns_name: Option<String>,
    pub remove_private_dns_name: Option<bool>,
    pub add_gateway_load_balancer_arns: Vec<String>,
    pub remove_gateway_load_balancer_arns: Vec<String>,
    pub add_network_load_balancer_arns: Vec<String>,
    pub remove_network_load_balancer_arns: Vec<String>,
    pub add_supported_ip_address_types: Vec<String>,
    pub remove_supported_ip_address_types: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyVpcEndpointServicePermissionsInput {
    pub service_id: String,
    pub add_allowed_principals: Vec<String>,
    pub remove_allowed_principals: Vec<String>,
}

#[async_trait]
pub trait VpcEndpointServiceApi: Send + Sync {
    async fn create_vpc_endpoint_service_configuration(
        &self,
        input: CreateVpcEndpointServiceConfigurationInput,
    ) -> Result<ServiceConfigurationDescription, ApiError>;
    async fn describe_vpc_endpoint_service_configurations(
        &self,
        service_ids: Vec<String>,
    ) -> Result<Vec<ServiceConfigurationDescription>, ApiError>;
    /// Returns the allowed principal ARNs.
    async fn describe_vpc_endpoint_service_permissions(
        &self,
        service_id: String,
    ) -> Result<Vec<String>, ApiError>;
    async fn modify_vpc_endpoint_service_configuration(
        &self,
        input: ModifyVpcEndpointServiceConfigurationInput,
    ) -> Result<(), ApiError>;
    async fn modify_vpc_endpoint_service_permissions(
        &self,
        input: ModifyVpcEndpointServicePermissionsInput,
    ) -> Result<(), ApiError>;
    async fn delete_vpc_endpoint_service_configurations(
        &self,
        service_ids: Vec<String>,
    ) -> Result<(), ApiError>;
}
