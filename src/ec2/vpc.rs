use async_trait::async_trait;
use serde::Serialize;

use super::{ApiError, Filter};
use crate::resources::vpc::CidrBlockAssociation;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateVpcInput {
    pub cidr_block: String,
    pub instance_tenancy: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VpcDescription {
    pub vpc_id: String,
    pub owner_id: Option<String>,
    pub state: Option<String>,
    pub dhcp_options_id: Option<String>,
    pub instance_tenancy: Option<String>,
    pub is_default: Option<bool>,
    pub cidr_block_association_set: Vec<CidrBlockAssociation>,
    pub tags: Vec<Tag>,
}

/// DNS attributes are read one per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VpcAttribute {
    #[serde(rename = "enableDnsSupport")]
    EnableDnsSupport,
    #[serde(rename = "enableDnsHostnames")]
    EnableDnsHostnames,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeVpcAttributeInput {
    pub vpc_id: String,
    pub attribute: VpcAttribute,
}

/// EC2 accepts a single attribute per ModifyVpcAttribute call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyVpcAttributeInput {
    pub vpc_id: String,
    pub enable_dns_support: Option<bool>,
    pub enable_dns_hostnames: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssociateVpcCidrBlockInput {
    pub vpc_id: String,
    pub cidr_block: String,
}

#[async_trait]
pub trait VpcApi: Send + Sync {
    async fn create_vpc(&self, input: CreateVpcInput) -> Result<VpcDescription, ApiError>;
    async fn describe_vpcs(&self, filters: Vec<Filter>) -> Result<Vec<VpcDescription>, ApiError>;
    async fn describe_vpc_attribute(
        &self,
        input: DescribeVpcAttributeInput,
    ) -> Result<Option<bool>, ApiError>;
    async fn modify_vpc_attribute(&self, input: ModifyVpcAttributeInput) -> Result<(), ApiError>;
    async fn associate_vpc_cidr_block(
        &self,
        input: AssociateVpcCidrBlockInput,
    ) -> Result<CidrBlockAssociation, ApiError>;
    async fn disassociate_vpc_cidr_block(&self, association_id: String) -> Result<(), ApiError>;
    async fn delete_vpc(&self, vpc_id: String) -> Result<(), ApiError>;
}
