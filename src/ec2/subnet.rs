use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSubnetInput {
    pub vpc_id: Option<String>,
    pub cidr_block: Option<String>,
    pub ipv6_cidr_block: Option<String>,
    pub availability_zone: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubnetDescription {
    pub subnet_id: String,
    pub vpc_id: Option<String>,
    pub owner_id: Option<String>,
    pub state: Option<String>,
    pub availability_zone: Option<String>,
    pub cidr_block: Option<String>,
    pub ipv6_cidr_block: Option<String>,
    pub map_public_ip_on_launch: Option<bool>,
    pub assign_ipv6_address_on_creation: Option<bool>,
    pub available_ip_address_count: Option<i64>,
    pub tags: Vec<Tag>,
}

/// EC2 accepts a single attribute per ModifySubnetAttribute call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifySubnetAttributeInput {
    pub subnet_id: String,
    pub map_public_ip_on_launch: Option<bool>,
    pub assign_ipv6_address_on_creation: Option<bool>,
}

#[async_trait]
pub trait SubnetApi: Send + Sync {
    async fn create_subnet(&self, input: CreateSubnetInput) -> Result<String, ApiError>;
    async fn describe_subnets(
        &self,
        subnet_ids: Vec<String>,
    ) -> Result<Vec<SubnetDescription>, ApiError>;
    async fn modify_subnet_attribute(
        &self,
        input: ModifySubnetAttributeInput,
    ) -> Result<(), ApiError>;
    async fn delete_subnet(&self, subnet_id: String) -> Result<(), ApiError>;
}
