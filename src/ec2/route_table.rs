use async_trait::async_trait;
use serde::Serialize;

use super::{ApiError, Filter};
use crate::resources::route_table::{Route, RouteTableAssociation};
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRouteTableInput {
    pub vpc_id: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteTableDescription {
    pub route_table_id: String,
    pub vpc_id: Option<String>,
    pub owner_id: Option<String>,
    pub routes: Vec<Route>,
    pub associations: Vec<RouteTableAssociation>,
    pub tags: Vec<Tag>,
}

/// Tables are selected by id, by filter, or both.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeRouteTablesInput {
    pub route_table_ids: Vec<String>,
    pub filters: Vec<Filter>,
}

/// Exactly one of `subnet_id` and `gateway_id` is set.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssociateRouteTableInput {
    pub route_table_id: String,
    pub subnet_id: Option<String>,
    pub gateway_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRouteInput {
    pub route_table_id: String,
    pub route: Route,
}

/// A route is deleted by destination alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRouteInput {
    pub route_table_id: String,
    pub destination_cidr_block: Option<String>,
    pub destination_ipv6_cidr_block: Option<String>,
    pub destination_prefix_list_id: Option<String>,
}

impl DeleteRouteInput {
    pub fn new(route_table_id: &str, route: &Route) -> Self {
        Self {
            route_table_id: route_table_id.to_string(),
            destination_cidr_block: route.destination_cidr_block.clone(),
            destination_ipv6_cidr_block: route.destination_ipv6_cidr_block.clone(),
            destination_prefix_list_id: route.destination_prefix_list_id.clone(),
        }
    }
}

#[async_trait]
pub trait RouteTableApi: Send + Sync {
    async fn create_route_table(&self, input: CreateRouteTableInput) -> Result<String, ApiError>;
    async fn describe_route_tables(
        &self,
        input: DescribeRouteTablesInput,
    ) -> Result<Vec<RouteTableDescription>, ApiError>;
    async fn create_route(&self, input: CreateRouteInput) -> Result<(), ApiError>;
    async fn delete_route(&self, input: DeleteRouteInput) -> Result<(), ApiError>;
    /// Returns the association id.
    async fn associate_route_table(
        &self,
        input: AssociateRouteTableInput,
    ) -> Result<String, ApiError>;
    async fn disassociate_route_table(&self, association_id: String) -> Result<(), ApiError>;
    async fn delete_route_table(&self, route_table_id: String) -> Result<(), ApiError>;
}
