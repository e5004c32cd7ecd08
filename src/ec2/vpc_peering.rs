use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::vpc_peering_connection::{PeeringConnectionOptions, PeeringStatus};
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateVpcPeeringConnectionInput {
    pub vpc_id: Option<String>,
    pub peer_vpc_id: Option<String>,
    pub peer_owner_id: Option<String>,
    pub peer_region: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeeringVpcInfo {
    pub vpc_id: Option<String>,
    pub owner_id: Option<String>,
    pub region: Option<String>,
    pub peering_options: Option<PeeringConnectionOptions>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VpcPeeringConnectionDescription {
    pub vpc_peering_connection_id: String,
    pub requester_vpc_info: PeeringVpcInfo,
    pub accepter_vpc_info: PeeringVpcInfo,
    pub status: Option<PeeringStatus>,
    pub expiration_time: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyVpcPeeringConnectionOptionsInput {
    pub vpc_peering_connection_id: String,
    pub accepter_peering_connection_options: Option<PeeringConnectionOptions>,
    pub requester_peering_connection_options: Option<PeeringConnectionOptions>,
}

#[async_trait]
pub trait VpcPeeringApi: Send + Sync {
    async fn create_vpc_peering_connection(
        &self,
        input: CreateVpcPeeringConnectionInput,
    ) -> Result<VpcPeeringConnectionDescription, ApiError>;
    async fn describe_vpc_peering_connections(
        &self,
        ids: Vec<String>,
    ) -> Result<Vec<VpcPeeringConnectionDescription>, ApiError>;
    async fn accept_vpc_peering_connection(
        &self,
        id: String,
    ) -> Result<VpcPeeringConnectionDescription, ApiError>;
    async fn modify_vpc_peering_connection_options(
        &self,
        input: ModifyVpcPeeringConnectionOptionsInput,
    ) -> Result<(), ApiError>;
    async fn delete_vpc_peering_connection(&self, id: String) -> Result<(), ApiError>;
}
