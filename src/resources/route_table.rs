use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, DuplicateKeys, FieldDelta, Subresource, SyncPolicy, UpdateMode};

/// Gateway of the route EC2 creates for the VPC CIDR.
pub const LOCAL_GATEWAY: &str = "local";

pub type RouteTable = Object<RouteTableSpec, RouteTableStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableSpec {
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for RouteTableSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "vpcID", &self.vpc_id, &other.vpc_id);
        let routes = |r: &[Route]| -> Vec<Route> {
            r.iter().filter(|r| !r.is_default()).map(Route::without_observed).collect()
        };
        delta.compare_collection(prefix, "routes", &routes(&self.routes), &routes(&other.routes));
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableStatus {
    #[serde(rename = "routeTableID")]
    pub id: Option<String>,
    pub owner_id: Option<String>,
    #[serde(default)]
    pub route_statuses: Vec<Route>,
    #[serde(default)]
    pub associations: Vec<RouteTableAssociation>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(rename = "carrierGatewayID")]
    pub carrier_gateway_id: Option<String>,
    pub core_network_arn: Option<String>,
    #[serde(rename = "destinationCIDRBlock")]
    pub destination_cidr_block: Option<String>,
    #[serde(rename = "destinationIPv6CIDRBlock")]
    pub destination_ipv6_cidr_block: Option<String>,
    #[serde(rename = "destinationPrefixListID")]
    pub destination_prefix_list_id: Option<String>,
    #[serde(rename = "egressOnlyInternetGatewayID")]
    pub egress_only_internet_gateway_id: Option<String>,
    #[serde(rename = "gatewayID")]
    pub gateway_id: Option<String>,
    #[serde(rename = "instanceID")]
    pub instance_id: Option<String>,
    #[serde(rename = "localGatewayID")]
    pub local_gateway_id: Option<String>,
    #[serde(rename = "natGatewayID")]
    pub nat_gateway_id: Option<String>,
    #[serde(rename = "networkInterfaceID")]
    pub network_interface_id: Option<String>,
    #[serde(rename = "transitGatewayID")]
    pub transit_gateway_id: Option<String>,
    #[serde(rename = "vpcEndpointID")]
    pub vpc_endpoint_id: Option<String>,
    #[serde(rename = "vpcPeeringConnectionID")]
    pub vpc_peering_connection_id: Option<String>,
    /// How the route was created. Reported by EC2 only.
    pub origin: Option<String>,
    /// `active` or `blackhole`. Reported by EC2 only.
    pub state: Option<String>,
}

impl Compare for Route {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        let fields = [
            ("carrierGatewayID", &self.carrier_gateway_id, &other.carrier_gateway_id),
            ("coreNetworkARN", &self.core_network_arn, &other.core_network_arn),
            ("destinationCIDRBlock", &self.destination_cidr_block, &other.destination_cidr_block),
            (
                "destinationIPv6CIDRBlock",
                &self.destination_ipv6_cidr_block,
                &other.destination_ipv6_cidr_block,
            ),
            (
                "destinationPrefixListID",
                &self.destination_prefix_list_id,
                &other.destination_prefix_list_id,
            ),
            (
                "egressOnlyInternetGatewayID",
                &self.egress_only_internet_gateway_id,
                &other.egress_only_internet_gateway_id,
            ),
            ("gatewayID", &self.gateway_id, &other.gateway_id),
            ("instanceID", &self.instance_id, &other.instance_id),
            ("localGatewayID", &self.local_gateway_id, &other.local_gateway_id),
            ("natGatewayID", &self.nat_gateway_id, &other.nat_gateway_id),
            ("networkInterfaceID", &self.network_interface_id, &other.network_interface_id),
            ("transitGatewayID", &self.transit_gateway_id, &other.transit_gateway_id),
            ("vpcEndpointID", &self.vpc_endpoint_id, &other.vpc_endpoint_id),
            (
                "vpcPeeringConnectionID",
                &self.vpc_peering_connection_id,
                &other.vpc_peering_connection_id,
            ),
            ("origin", &self.origin, &other.origin),
            ("state", &self.state, &other.state),
        ];
        for (field, a, b) in fields {
            delta.compare_field(prefix, field, a, b);
        }
    }
}

/// Routes are identified by their destination. EC2 has no in-place replace
/// here, and a route table never holds two routes for the same destination.
impl Subresource for Route {
    type Key = (Option<String>, Option<String>, Option<String>);
    const KIND: &'static str = "route";
    const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::Replace, DuplicateKeys::Reject);
    const IGNORED_FIELDS: &'static [&'static str] = &["origin", "state"];

    fn key(&self) -> Self::Key {
        (
            self.destination_cidr_block.clone(),
            self.destination_ipv6_cidr_block.clone(),
            self.destination_prefix_list_id.clone(),
        )
    }

    fn is_default(&self) -> bool {
        self.gateway_id.as_deref() == Some(LOCAL_GATEWAY)
            || matches!(
                self.origin.as_deref(),
                Some("CreateRouteTable") | Some("EnableVgwRoutePropagation")
            )
    }

    fn validate(&self) -> Result<(), String> {
        let destinations = [
            &self.destination_cidr_block,
            &self.destination_ipv6_cidr_block,
            &self.destination_prefix_list_id,
        ];
        match destinations.iter().filter(|d| d.is_some()).count() {
            1 => Ok(()),
            0 => Err("a destination is required".into()),
            _ => Err("only one destination may be set".into()),
        }
    }
}

impl Route {
    /// The route without the fields only EC2 reports.
    pub fn without_observed(&self) -> Route {
        Route {
            origin: None,
            state: None,
            ..self.clone()
        }
    }
}

/// An explicit association of a route table with a subnet or a gateway.
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableAssociation {
    #[serde(rename = "routeTableAssociationID")]
    pub id: Option<String>,
    #[serde(rename = "routeTableID")]
    pub route_table_id: Option<String>,
    #[serde(rename = "subnetID")]
    pub subnet_id: Option<String>,
    #[serde(rename = "gatewayID")]
    pub gateway_id: Option<String>,
    /// Set on the implicit association of the VPC's main route table.
    pub main: Option<bool>,
    /// `associating`, `associated`, `disassociating`, `disassociated` or `failed`
    pub state: Option<String>,
}

impl RouteTableAssociation {
    pub fn is_associated(&self) -> bool {
        !self.main.unwrap_or_default()
            && matches!(self.state.as_deref(), None | Some("associated" | "associating"))
    }
}
