use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::route_table::RouteTableAssociation;
use super::{Object, Tag};
use crate::reconcilers::{Compare, FieldDelta};

pub type InternetGateway = Object<InternetGatewaySpec, InternetGatewayStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InternetGatewaySpec {
    /// The attached VPC. Unset means detached.
    pub vpc: Option<String>,
    /// Route tables associated with the gateway as edge associations.
    pub route_tables: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for InternetGatewaySpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "vpc", &self.vpc, &other.vpc);
        delta.compare_desired_set(prefix, "routeTables", &self.route_tables, &other.route_tables);
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InternetGatewayStatus {
    #[serde(rename = "internetGatewayID")]
    pub id: Option<String>,
    pub owner_id: Option<String>,
    #[serde(default)]
    pub attachments: Vec<InternetGatewayAttachment>,
    #[serde(default)]
    pub route_table_associations: Vec<RouteTableAssociation>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InternetGatewayAttachment {
    /// `attaching`, `attached`, `detaching` or `detached`
    pub state: Option<String>,
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
}

/// The VPC the gateway is attached to or being attached to.
pub fn attached_vpc(attachments: &[InternetGatewayAttachment]) -> Option<String> {
    attachments
        .iter()
        .find(|a| !matches!(a.state.as_deref(), Some("detached" | "detaching")))
        .and_then(|a| a.vpc_id.clone())
}
