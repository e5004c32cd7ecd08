use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::internet_gateway::InternetGatewayAttachment;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInternetGatewayInput {
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InternetGatewayDescription {
    pub internet_gateway_id: String,
    pub owner_id: Option<String>,
    pub attachments: Vec<InternetGatewayAttachment>,
    pub tags: Vec<Tag>,
}

/// Input of AttachInternetGateway and DetachInternetGateway.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGatewayAttachmentInput {
    pub internet_gateway_id: String,
    pub vpc_id: String,
}

#[async_trait]
pub trait InternetGatewayApi: Send + Sync {
    async fn create_internet_gateway(
        &self,
        input: CreateInternetGatewayInput,
    ) -> Result<String, ApiError>;
    async fn describe_internet_gateways(
        &self,
        internet_gateway_ids: Vec<String>,
    ) -> Result<Vec<InternetGatewayDescription>, ApiError>;
    async fn attach_internet_gateway(
        &self,
        input: InternetGatewayAttachmentInput,
    ) -> Result<(), ApiError>;
    async fn detach_internet_gateway(
        &self,
        input: InternetGatewayAttachmentInput,
    ) -> Result<(), ApiError>;
    async fn delete_internet_gateway(&self, internet_gateway_id: String) -> Result<(), ApiError>;
}
