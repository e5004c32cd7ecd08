use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::dhcp_options::DhcpConfiguration;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDhcpOptionsInput {
    pub dhcp_configurations: Vec<DhcpConfiguration>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DhcpOptionsDescription {
    pub dhcp_options_id: String,
    pub owner_id: Option<String>,
    pub dhcp_configurations: Vec<DhcpConfiguration>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssociateDhcpOptionsInput {
    pub dhcp_options_id: String,
    pub vpc_id: String,
}

#[async_trait]
pub trait DhcpOptionsApi: Send + Sync {
    async fn create_dhcp_options(&self, input: CreateDhcpOptionsInput) -> Result<String, ApiError>;
    async fn describe_dhcp_options(
        &self,
        dhcp_options_ids: Vec<String>,
    ) -> Result<Vec<DhcpOptionsDescription>, ApiError>;
    async fn associate_dhcp_options(
        &self,
        input: AssociateDhcpOptionsInput,
    ) -> Result<(), ApiError>;
    async fn delete_dhcp_options(&self, dhcp_options_id: String) -> Result<(), ApiError>;
}
