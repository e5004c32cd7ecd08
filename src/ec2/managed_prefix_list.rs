use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::managed_prefix_list::PrefixListEntry;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateManagedPrefixListInput {
    pub prefix_list_name: Option<String>,
    pub address_family: Option<String>,
    pub max_entries: Option<i64>,
    pub entries: Vec<PrefixListEntry>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManagedPrefixListDescription {
    pub prefix_list_id: String,
    pub prefix_list_arn: Option<String>,
    pub prefix_list_name: Option<String>,
    pub address_family: Option<String>,
    pub max_entries: Option<i64>,
    pub owner_id: Option<String>,
    pub state: Option<String>,
    pub state_message: Option<String>,
    pub version: Option<i64>,
    pub tags: Vec<Tag>,
}

/// EC2 rejects a request that changes entries and `max_entries` together.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyManagedPrefixListInput {
    pub prefix_list_id: String,
    pub current_version: Option<i64>,
    pub prefix_list_name: Option<String>,
    pub max_entries: Option<i64>,
    pub add_entries: Vec<PrefixListEntry>,
    /// Only the CIDR of a removed entry is sent.
    pub remove_entries: Vec<String>,
}

#[async_trait]
pub trait ManagedPrefixListApi: Send + Sync {
    async fn create_managed_prefix_list(
        &self,
        input: CreateManagedPrefixListInput,
    ) -> Result<ManagedPrefixListDescription, ApiError>;
    async fn describe_managed_prefix_lists(
        &self,
        prefix_list_ids: Vec<String>,
    ) -> Result<Vec<ManagedPrefixListDescription>, ApiError>;
    async fn get_managed_prefix_list_entries(
        &self,
        prefix_list_id: String,
    ) -> Result<Vec<PrefixListEntry>, ApiError>;
    async fn modify_managed_prefix_list(
        &self,
        input: ModifyManagedPrefixListInput,
    ) -> Result<ManagedPrefixListDescription, ApiError>;
    async fn delete_managed_prefix_list(&self, prefix_list_id: String) -> Result<(), ApiError>;
}
