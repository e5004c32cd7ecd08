use async_trait::async_trait;
use serde::Serialize;

use super::{ApiError, Filter};
use crate::resources::network_acl::{NetworkAclAssociation, NetworkAclEntry};
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateNetworkAclInput {
    pub vpc_id: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeNetworkAclsInput {
    pub network_acl_ids: Vec<String>,
    pub filters: Vec<Filter>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkAclDescription {
    pub network_acl_id: String,
    pub vpc_id: Option<String>,
    pub owner_id: Option<String>,
    pub is_default: Option<bool>,
    pub entries: Vec<NetworkAclEntry>,
    pub associations: Vec<NetworkAclAssociation>,
    pub tags: Vec<Tag>,
}

/// Input of CreateNetworkAclEntry and ReplaceNetworkAclEntry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkAclEntryInput {
    pub network_acl_id: String,
    pub entry: NetworkAclEntry,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteNetworkAclEntryInput {
    pub network_acl_id: String,
    pub egress: bool,
    pub rule_number: i64,
}

/// Moves the subnet behind `association_id` to `network_acl_id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplaceNetworkAclAssociationInput {
    pub association_id: String,
    pub network_acl_id: String,
}

#[async_trait]
pub trait NetworkAclApi: Send + Sync {
    async fn create_network_acl(&self, input: CreateNetworkAclInput) -> Result<String, ApiError>;
    async fn describe_network_acls(
        &self,
        input: DescribeNetworkAclsInput,
    ) -> Result<Vec<NetworkAclDescription>, ApiError>;
    async fn create_network_acl_entry(&self, input: NetworkAclEntryInput) -> Result<(), ApiError>;
    async fn replace_network_acl_entry(&self, input: NetworkAclEntryInput) -> Result<(), ApiError>;
    async fn delete_network_acl_entry(
        &self,
        input: DeleteNetworkAclEntryInput,
    ) -> Result<(), ApiError>;
    /// Returns the id of the new association.
    async fn replace_network_acl_association(
        &self,
        input: ReplaceNetworkAclAssociationInput,
    ) -> Result<String, ApiError>;
    async fn delete_network_acl(&self, network_acl_id: String) -> Result<(), ApiError>;
}
