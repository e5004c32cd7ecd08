use async_trait::async_trait;
use serde::Serialize;

use super::{ApiError, Filter};
use crate::resources::security_group::{IpPermission, SecurityGroupRule};
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSecurityGroupInput {
    pub group_name: Option<String>,
    pub description: Option<String>,
    pub vpc_id: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecurityGroupDescription {
    pub group_id: String,
    pub group_name: Option<String>,
    pub description: Option<String>,
    pub vpc_id: Option<String>,
    pub owner_id: Option<String>,
    pub ip_permissions: Vec<IpPermission>,
    pub ip_permissions_egress: Vec<IpPermission>,
    pub tags: Vec<Tag>,
}

/// Groups are selected by id, by filter, or both.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeSecurityGroupsInput {
    pub group_ids: Vec<String>,
    pub filters: Vec<Filter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeSecurityGroupRulesInput {
    pub filters: Vec<Filter>,
    pub next_token: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DescribeSecurityGroupRulesOutput {
    pub rules: Vec<SecurityGroupRule>,
    pub next_token: Option<String>,
}

/// Input of the Authorize and Revoke Ingress/Egress calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupPermissionsInput {
    pub group_id: String,
    pub ip_permissions: Vec<IpPermission>,
}

#[async_trait]
pub trait SecurityGroupApi: Send + Sync {
    /// Returns the new group id.
    async fn create_security_group(
        &self,
        input: CreateSecurityGroupInput,
    ) -> Result<String, ApiError>;
    async fn describe_security_groups(
        &self,
        input: DescribeSecurityGroupsInput,
    ) -> Result<Vec<SecurityGroupDescription>, ApiError>;
    async fn describe_security_group_rules(
        &self,
        input: DescribeSecurityGroupRulesInput,
    ) -> Result<DescribeSecurityGroupRulesOutput, ApiError>;
    async fn authorize_security_group_ingress(
        &self,
        input: SecurityGroupPermissionsInput,
    ) -> Result<(), ApiError>;
    async fn authorize_security_group_egress(
        &self,
        input: SecurityGroupPermissionsInput,
    ) -> Result<(), ApiError>;
    async fn revoke_security_group_ingress(
        &self,
        input: SecurityGroupPermissionsInput,
    ) -> Result<(), ApiError>;
    async fn revoke_security_group_egress(
        &self,
        input: SecurityGroupPermissionsInput,
    ) -> Result<(), ApiError>;
    async fn delete_security_group(&self, group_id: String) -> Result<(), ApiError>;
}
