use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::transit_gateway_vpc_attachment::AttachmentOptions;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTransitGatewayVpcAttachmentInput {
    pub transit_gateway_id: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
    pub options: Option<AttachmentOptions>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitGatewayVpcAttachmentDescription {
    pub transit_gateway_attachment_id: String,
    pub transit_gateway_id: Option<String>,
    pub vpc_id: Option<String>,
    pub vpc_owner_id: Option<String>,
    pub subnet_ids: Vec<String>,
    pub options: Option<AttachmentOptions>,
    pub state: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyTransitGatewayVpcAttachmentInput {
    pub transit_gateway_attachment_id: String,
    pub add_subnet_ids: Vec<String>,
    pub remove_subnet_ids: Vec<String>,
    pub options: Option<AttachmentOptions>,
}

#[async_trait]
pub trait TransitGatewayApi: Send + Sync {
    async fn create_transit_gateway_vpc_attachment(
        &self,
        input: CreateTransitGatewayVpcAttachmentInput,
    ) -> Result<TransitGatewayVpcAttachmentDescription, ApiError>;
    async fn describe_transit_gateway_vpc_attachments(
        &self,
        attachment_ids: Vec<String>,
    ) -> Result<Vec<TransitGatewayVpcAttachmentDescription>, ApiError>;
    async fn modify_transit_gateway_vpc_attachment(
        &self,
        input: ModifyTransitGatewayVpcAttachmentInput,
    ) -> Result<TransitGatewayVpcAttachmentDescription, ApiError>;
    async fn delete_transit_gateway_vpc_attachment(
        &self,
        attachment_id: String,
    ) -> Result<TransitGatewayVpcAttachmentDescription, ApiError>;
}
