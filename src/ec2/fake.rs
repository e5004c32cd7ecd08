//! In-memory EC2 client for tests.
//!
//! Every call is recorded with its serialized input. Describe responses are
//! scripted per operation: each call consumes the next queued response and
//! the last one repeats.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::*;
use crate::resources::managed_prefix_list::PrefixListEntry;
use crate::resources::security_group::SecurityGroupRule;
use crate::resources::vpc::CidrBlockAssociation;

#[derive(Clone, Debug)]
pub(crate) struct Call {
    pub operation: &'static str,
    pub input: Value,
}

struct Script<T>(Mutex<VecDeque<T>>);

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self(Mutex::new(VecDeque::new()))
    }
}

impl<T: Clone + Default> Script<T> {
    fn push(&self, value: T) {
        self.0.lock().unwrap().push_back(value);
    }

    fn next(&self) -> T {
        let mut queue = self.0.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or_default()
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeEc2 {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<&'static str, VecDeque<ApiError>>>,
    security_groups: Script<Vec<SecurityGroupDescription>>,
    security_group_rules: Script<Vec<SecurityGroupRule>>,
    network_acls: Script<Vec<NetworkAclDescription>>,
    route_tables: Script<Vec<RouteTableDescription>>,
    dhcp_options: Script<Vec<DhcpOptionsDescription>>,
    vpcs: Script<Vec<VpcDescription>>,
    vpc_attributes: Script<Vec<(VpcAttribute, bool)>>,
    subnets: Script<Vec<SubnetDescription>>,
    vpc_endpoints: Script<Vec<VpcEndpointDescription>>,
    internet_gateways: Script<Vec<InternetGatewayDescription>>,
    prefix_lists: Script<Vec<ManagedPrefixListDescription>>,
    prefix_list_entries: Script<Vec<PrefixListEntry>>,
    attachments: Script<Vec<TransitGatewayVpcAttachmentDescription>>,
    peering_connections: Script<Vec<VpcPeeringConnectionDescription>>,
    service_configurations: Script<Vec<ServiceConfigurationDescription>>,
    service_permissions: Script<Vec<String>>,
    /// Page size of DescribeSecurityGroupRules.
    pub rules_page_size: usize,
}

impl FakeEc2 {
    pub fn new() -> Self {
        Self {
            rules_page_size: 2,
            ..Default::default()
        }
    }

    /// Fail the next call to `operation`.
    pub fn fail(&self, operation: &'static str, code: &str) {
        self.failures
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(ApiError::new(code, format!("{operation} failed")));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.operation).collect()
    }

    /// Operations that change EC2 state, in call order.
    pub fn mutations(&self) -> Vec<&'static str> {
        self.operations()
            .into_iter()
            .filter(|op| !op.starts_with("Describe") && !op.starts_with("Get"))
            .collect()
    }

    pub fn inputs(&self, operation: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .map(|c| c.input)
            .collect()
    }

    pub fn push_security_groups(&self, v: Vec<SecurityGroupDescription>) {
        self.security_groups.push(v)
    }
    pub fn push_security_group_rules(&self, v: Vec<SecurityGroupRule>) {
        self.security_group_rules.push(v)
    }
    pub fn push_network_acls(&self, v: Vec<NetworkAclDescription>) {
        self.network_acls.push(v)
    }
    pub fn push_route_tables(&self, v: Vec<RouteTableDescription>) {
        self.route_tables.push(v)
    }
    pub fn push_dhcp_options(&self, v: Vec<DhcpOptionsDescription>) {
        self.dhcp_options.push(v)
    }
    pub fn push_vpcs(&self, v: Vec<VpcDescription>) {
        self.vpcs.push(v)
    }
    pub fn push_vpc_attributes(&self, v: Vec<(VpcAttribute, bool)>) {
        self.vpc_attributes.push(v)
    }
    pub fn push_subnets(&self, v: Vec<SubnetDescription>) {
        self.subnets.push(v)
    }
    pub fn push_vpc_endpoints(&self, v: Vec<VpcEndpointDescription>) {
        self.vpc_endpoints.push(v)
    }
    pub fn push_internet_gateways(&self, v: Vec<InternetGatewayDescription>) {
        self.internet_gateways.push(v)
    }
    pub fn push_prefix_lists(&self, v: Vec<ManagedPrefixListDescription>) {
        self.prefix_lists.push(v)
    }
    pub fn push_prefix_list_entries(&self, v: Vec<PrefixListEntry>) {
        self.prefix_list_entries.push(v)
    }
    pub fn push_attachments(&self, v: Vec<TransitGatewayVpcAttachmentDescription>) {
        self.attachments.push(v)
    }
    pub fn push_peering_connections(&self, v: Vec<VpcPeeringConnectionDescription>) {
        self.peering_connections.push(v)
    }
    pub fn push_service_configurations(&self, v: Vec<ServiceConfigurationDescription>) {
        self.service_configurations.push(v)
    }
    pub fn push_service_permissions(&self, v: Vec<String>) {
        self.service_permissions.push(v)
    }

    fn record<I: Serialize>(&self, operation: &'static str, input: &I) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Call {
            operation,
            input: serde_json::to_value(input).unwrap(),
        });
        match self.failures.lock().unwrap().get_mut(operation) {
            Some(queue) => queue.pop_front().map_or(Ok(()), Err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TagsApi for FakeEc2 {
    async fn create_tags(&self, input: CreateTagsInput) -> Result<(), ApiError> {
        self.record("CreateTags", &input)
    }

    async fn delete_tags(&self, input: DeleteTagsInput) -> Result<(), ApiError> {
        self.record("DeleteTags", &input)
    }
}

#[async_trait]
impl SecurityGroupApi for FakeEc2 {
    async fn create_security_group(
        &self,
        input: CreateSecurityGroupInput,
    ) -> Result<String, ApiError> {
        self.record("CreateSecurityGroup", &input)?;
        Ok("sg-new".into())
    }

    async fn describe_security_groups(
        &self,
        input: DescribeSecurityGroupsInput,
    ) -> Result<Vec<SecurityGroupDescription>, ApiError> {
        self.record("DescribeSecurityGroups", &input)?;
        Ok(self
            .security_groups
            .next()
            .into_iter()
            .filter(|group| {
                input.filters.iter().all(|f| match f.name.as_str() {
                    "vpc-id" => group.vpc_id.as_ref().is_some_and(|v| f.values.contains(v)),
                    "group-name" => group.group_name.as_ref().is_some_and(|n| f.values.contains(n)),
                    _ => true,
                })
            })
            .collect())
    }

    async fn describe_security_group_rules(
        &self,
        input: DescribeSecurityGroupRulesInput,
    ) -> Result<DescribeSecurityGroupRulesOutput, ApiError> {
        self.record("DescribeSecurityGroupRules", &input)?;
        let rules = self.security_group_rules.next();
        let start: usize = input
            .next_token
            .as_deref()
            .map_or(0, |t| t.parse().unwrap());
        let end = (start + self.rules_page_size.max(1)).min(rules.len());
        Ok(DescribeSecurityGroupRulesOutput {
            rules: rules[start..end].to_vec(),
            next_token: (end < rules.len()).then(|| end.to_string()),
        })
    }

    async fn authorize_security_group_ingress(
        &self,
        input: SecurityGroupPermissionsInput,
    ) -> Result<(), ApiError> {
        self.record("AuthorizeSecurityGroupIngress", &input)
    }

    async fn authorize_security_group_egress(
        &self,
        input: SecurityGroupPermissionsInput,
    ) -> Result<(), ApiError> {
        self.record("AuthorizeSecurityGroupEgress", &input)
    }

    async fn revoke_security_group_ingress(
        &self,
        input: SecurityGroupPermissionsInput,
    ) -> Result<(), ApiError> {
        self.record("RevokeSecurityGroupIngress", &input)
    }

    async fn revoke_security_group_egress(
        &self,
        input: SecurityGroupPermissionsInput,
    ) -> Result<(), ApiError> {
        self.record("RevokeSecurityGroupEgress", &input)
    }

    async fn delete_security_group(&self, group_id: String) -> Result<(), ApiError> {
        self.record("DeleteSecurityGroup", &group_id)
    }
}

#[async_trait]
impl NetworkAclApi for FakeEc2 {
    async fn create_network_acl(&self, input: CreateNetworkAclInput) -> Result<String, ApiError> {
        self.record("CreateNetworkAcl", &input)?;
        Ok("acl-new".into())
    }

    async fn describe_network_acls(
        &self,
        input: DescribeNetworkAclsInput,
    ) -> Result<Vec<NetworkAclDescription>, ApiError> {
        self.record("DescribeNetworkAcls", &input)?;
        let acls = self.network_acls.next();
        // filters select from the scripted set the way EC2 would
        Ok(acls
            .into_iter()
            .filter(|acl| {
                input.network_acl_ids.is_empty()
                    || input.network_acl_ids.contains(&acl.network_acl_id)
            })
            .filter(|acl| {
                input.filters.iter().all(|f| match f.name.as_str() {
                    "default" => f.values.contains(&acl.is_default.unwrap_or_default().to_string()),
                    "vpc-id" => acl.vpc_id.as_ref().is_some_and(|v| f.values.contains(v)),
                    "association.subnet-id" => acl
                        .associations
                        .iter()
                        .any(|a| a.subnet_id.as_ref().is_some_and(|s| f.values.contains(s))),
                    _ => true,
                })
            })
            .collect())
    }

    async fn create_network_acl_entry(&self, input: NetworkAclEntryInput) -> Result<(), ApiError> {
        self.record("CreateNetworkAclEntry", &input)
    }

    async fn replace_network_acl_entry(&self, input: NetworkAclEntryInput) -> Result<(), ApiError> {
        self.record("ReplaceNetworkAclEntry", &input)
    }

    async fn delete_network_acl_entry(
        &self,
        input: DeleteNetworkAclEntryInput,
    ) -> Result<(), ApiError> {
        self.record("DeleteNetworkAclEntry", &input)
    }

    async fn replace_network_acl_association(
        &self,
        input: ReplaceNetworkAclAssociationInput,
    ) -> Result<String, ApiError> {
        self.record("ReplaceNetworkAclAssociation", &input)?;
        Ok(format!("{}-replaced", input.association_id))
    }

    async fn delete_network_acl(&self, network_acl_id: String) -> Result<(), ApiError> {
        self.record("DeleteNetworkAcl", &network_acl_id)
    }
}

#[async_trait]
impl RouteTableApi for FakeEc2 {
    async fn create_route_table(&self, input: CreateRouteTableInput) -> Result<String, ApiError> {
        self.record("CreateRouteTable", &input)?;
        Ok("rtb-new".into())
    }

    async fn describe_route_tables(
        &self,
        input: DescribeRouteTablesInput,
    ) -> Result<Vec<RouteTableDescription>, ApiError> {
        self.record("DescribeRouteTables", &input)?;
        let associated = |table: &RouteTableDescription, f: &Filter, subnet: bool| {
            table.associations.iter().any(|a| {
                let target = if subnet { &a.subnet_id } else { &a.gateway_id };
                target.as_ref().is_some_and(|t| f.values.contains(t))
            })
        };
        Ok(self
            .route_tables
            .next()
            .into_iter()
            .filter(|table| {
                input.filters.iter().all(|f| match f.name.as_str() {
                    "vpc-id" => table.vpc_id.as_ref().is_some_and(|v| f.values.contains(v)),
                    "association.subnet-id" => associated(table, f, true),
                    "association.gateway-id" => associated(table, f, false),
                    _ => true,
                })
            })
            .collect())
    }

    async fn associate_route_table(
        &self,
        input: AssociateRouteTableInput,
    ) -> Result<String, ApiError> {
        self.record("AssociateRouteTable", &input)?;
        Ok(format!("rtbassoc-{}", input.route_table_id))
    }

    async fn disassociate_route_table(&self, association_id: String) -> Result<(), ApiError> {
        self.record("DisassociateRouteTable", &association_id)
    }

    async fn create_route(&self, input: CreateRouteInput) -> Result<(), ApiError> {
        self.record("CreateRoute", &input)
    }

    async fn delete_route(&self, input: DeleteRouteInput) -> Result<(), ApiError> {
        self.record("DeleteRoute", &input)
    }

    async fn delete_route_table(&self, route_table_id: String) -> Result<(), ApiError> {
        self.record("DeleteRouteTable", &route_table_id)
    }
}

#[async_trait]
impl DhcpOptionsApi for FakeEc2 {
    async fn create_dhcp_options(&self, input: CreateDhcpOptionsInput) -> Result<String, ApiError> {
        self.record("CreateDhcpOptions", &input)?;
        Ok("dopt-new".into())
    }

    async fn describe_dhcp_options(
        &self,
        dhcp_options_ids: Vec<String>,
    ) -> Result<Vec<DhcpOptionsDescription>, ApiError> {
        self.record("DescribeDhcpOptions", &dhcp_options_ids)?;
        Ok(self.dhcp_options.next())
    }

    async fn associate_dhcp_options(
        &self,
        input: AssociateDhcpOptionsInput,
    ) -> Result<(), ApiError> {
        self.record("AssociateDhcpOptions", &input)
    }

    async fn delete_dhcp_options(&self, dhcp_options_id: String) -> Result<(), ApiError> {
        self.record("DeleteDhcpOptions", &dhcp_options_id)
    }
}

#[async_trait]
impl ManagedPrefixListApi for FakeEc2 {
    async fn create_managed_prefix_list(
        &self,
        input: CreateManagedPrefixListInput,
    ) -> Result<ManagedPrefixListDescription, ApiError> {
        self.record("CreateManagedPrefixList", &input)?;
        Ok(ManagedPrefixListDescription {
            prefix_list_id: "pl-new".into(),
            state: Some("create-in-progress".into()),
            version: Some(1),
            ..Default::default()
        })
    }

    async fn describe_managed_prefix_lists(
        &self,
        prefix_list_ids: Vec<String>,
    ) -> Result<Vec<ManagedPrefixListDescription>, ApiError> {
        self.record("DescribeManagedPrefixLists", &prefix_list_ids)?;
        Ok(self.prefix_lists.next())
    }

    async fn get_managed_prefix_list_entries(
        &self,
        prefix_list_id: String,
    ) -> Result<Vec<PrefixListEntry>, ApiError> {
        self.record("GetManagedPrefixListEntries", &prefix_list_id)?;
        Ok(self.prefix_list_entries.next())
    }

    async fn modify_managed_prefix_list(
        &self,
        input: ModifyManagedPrefixListInput,
    ) -> Result<ManagedPrefixListDescription, ApiError> {
        self.record("ModifyManagedPrefixList", &input)?;
        Ok(ManagedPrefixListDescription {
            prefix_list_id: input.prefix_list_id,
            state: Some("modify-in-progress".into()),
            version: input.current_version.map(|v| v + 1),
            ..Default::default()
        })
    }

    async fn delete_managed_prefix_list(&self, prefix_list_id: String) -> Result<(), ApiError> {
        self.record("DeleteManagedPrefixList", &prefix_list_id)
    }
}

#[async_trait]
impl TransitGatewayApi for FakeEc2 {
    async fn create_transit_gateway_vpc_attachment(
        &self,
        input: CreateTransitGatewayVpcAttachmentInput,
    ) -> Result<TransitGatewayVpcAttachmentDescription, ApiError> {
        self.record("CreateTransitGatewayVpcAttachment", &input)?;
        Ok(TransitGatewayVpcAttachmentDescription {
            transit_gateway_attachment_id: "tgw-attach-new".into(),
            state: Some("pending".into()),
            ..Default::default()
        })
    }

    async fn describe_transit_gateway_vpc_attachments(
        &self,
        attachment_ids: Vec<String>,
    ) -> Result<Vec<TransitGatewayVpcAttachmentDescription>, ApiError> {
        self.record("DescribeTransitGatewayVpcAttachments", &attachment_ids)?;
        Ok(self.attachments.next())
    }

    async fn modify_transit_gateway_vpc_attachment(
        &self,
        input: ModifyTransitGatewayVpcAttachmentInput,
    ) -> Result<TransitGatewayVpcAttachmentDescription, ApiError> {
        self.record("ModifyTransitGatewayVpcAttachment", &input)?;
        Ok(TransitGatewayVpcAttachmentDescription {
            transit_gateway_attachment_id: input.transit_gateway_attachment_id,
            state: Some("modifying".into()),
            ..Default::default()
        })
    }

    async fn delete_transit_gateway_vpc_attachment(
        &self,
        attachment_id: String,
    ) -> Result<TransitGatewayVpcAttachmentDescription, ApiError> {
        self.record("DeleteTransitGatewayVpcAttachment", &attachment_id)?;
        Ok(TransitGatewayVpcAttachmentDescription {
            transit_gateway_attachment_id: attachment_id,
            state: Some("deleting".into()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl VpcPeeringApi for FakeEc2 {
    async fn create_vpc_peering_connection(
        &self,
        input: CreateVpcPeeringConnectionInput,
    ) -> Result<VpcPeeringConnectionDescription, ApiError> {
        self.record("CreateVpcPeeringConnection", &input)?;
        Ok(VpcPeeringConnectionDescription {
            vpc_peering_connection_id: "pcx-new".into(),
            ..Default::default()
        })
    }

    async fn describe_vpc_peering_connections(
        &self,
        ids: Vec<String>,
    ) -> Result<Vec<VpcPeeringConnectionDescription>, ApiError> {
        self.record("DescribeVpcPeeringConnections", &ids)?;
        Ok(self.peering_connections.next())
    }

    async fn accept_vpc_peering_connection(
        &self,
        id: String,
    ) -> Result<VpcPeeringConnectionDescription, ApiError> {
        self.record("AcceptVpcPeeringConnection", &id)?;
        Ok(VpcPeeringConnectionDescription {
            vpc_peering_connection_id: id,
            ..Default::default()
        })
    }

    async fn modify_vpc_peering_connection_options(
        &self,
        input: ModifyVpcPeeringConnectionOptionsInput,
    ) -> Result<(), ApiError> {
        self.record("ModifyVpcPeeringConnectionOptions", &input)
    }

    async fn delete_vpc_peering_connection(&self, id: String) -> Result<(), ApiError> {
        self.record("DeleteVpcPeeringConnection", &id)
    }
}

#[async_trait]
impl VpcEndpointServiceApi for FakeEc2 {
    async fn create_vpc_endpoint_service_configuration(
        &self,
        input: CreateVpcEndpointServiceConfigurationInput,
    ) -> Result<ServiceConfigurationDescription, ApiError> {
        self.record("CreateVpcEndpointServiceConfiguration", &input)?;
        Ok(ServiceConfigurationDescription {
            service_id: "vpce-svc-new".into(),
            service_state: Some("Pending".into()),
            ..Default::default()
        })
    }

    async fn describe_vpc_endpoint_service_configurations(
        &self,
        service_ids: Vec<String>,
    ) -> Result<Vec<ServiceConfigurationDescription>, ApiError> {
        self.record("DescribeVpcEndpointServiceConfigurations", &service_ids)?;
        Ok(self.service_configurations.next())
    }

    async fn describe_vpc_endpoint_service_permissions(
        &self,
        service_id: String,
    ) -> Result<Vec<String>, ApiError> {
        self.record("DescribeVpcEndpointServicePermissions", &service_id)?;
        Ok(self.service_permissions.next())
    }

    async fn modify_vpc_endpoint_service_configuration(
        &self,
        input: ModifyVpcEndpointServiceConfigurationInput,
    ) -> Result<(), ApiError> {
        self.record("ModifyVpcEndpointServiceConfiguration", &input)
    }

    async fn modify_vpc_endpoint_service_permissions(
        &self,
        input: ModifyVpcEndpointServicePermissionsInput,
    ) -> Result<(), ApiError> {
        self.record("ModifyVpcEndpointServicePermissions", &input)
    }

    async fn delete_vpc_endpoint_service_configurations(
        &self,
        service_ids: Vec<String>,
    ) -> Result<(), ApiError> {
        self.record("DeleteVpcEndpointServiceConfigurations", &service_ids)
    }
}

#[async_trait]
impl VpcApi for FakeEc2 {
    async fn create_vpc(&self, input: CreateVpcInput) -> Result<VpcDescription, ApiError> {
        self.record("CreateVpc", &input)?;
        Ok(VpcDescription {
            vpc_id: "vpc-new".into(),
            state: Some("pending".into()),
            ..Default::default()
        })
    }

    async fn describe_vpcs(&self, filters: Vec<Filter>) -> Result<Vec<VpcDescription>, ApiError> {
        self.record("DescribeVpcs", &filters)?;
        Ok(self
            .vpcs
            .next()
            .into_iter()
            .filter(|vpc| {
                filters.iter().all(|f| match f.name.as_str() {
                    "vpc-id" => f.values.contains(&vpc.vpc_id),
                    "dhcp-options-id" => {
                        vpc.dhcp_options_id.as_ref().is_some_and(|d| f.values.contains(d))
                    }
                    _ => true,
                })
            })
            .collect())
    }

    async fn describe_vpc_attribute(
        &self,
        input: DescribeVpcAttributeInput,
    ) -> Result<Option<bool>, ApiError> {
        self.record("DescribeVpcAttribute", &input)?;
        Ok(self
            .vpc_attributes
            .next()
            .into_iter()
            .find(|(attribute, _)| *attribute == input.attribute)
            .map(|(_, value)| value))
    }

    async fn modify_vpc_attribute(&self, input: ModifyVpcAttributeInput) -> Result<(), ApiError> {
        self.record("ModifyVpcAttribute", &input)
    }

    async fn associate_vpc_cidr_block(
        &self,
        input: AssociateVpcCidrBlockInput,
    ) -> Result<CidrBlockAssociation, ApiError> {
        self.record("AssociateVpcCidrBlock", &input)?;
        Ok(CidrBlockAssociation {
            association_id: Some(format!("vpc-cidr-assoc-{}", input.cidr_block)),
            cidr_block: Some(input.cidr_block),
            state: Some("associating".into()),
        })
    }

    async fn disassociate_vpc_cidr_block(&self, association_id: String) -> Result<(), ApiError> {
        self.record("DisassociateVpcCidrBlock", &association_id)
    }

    async fn delete_vpc(&self, vpc_id: String) -> Result<(), ApiError> {
        self.record("DeleteVpc", &vpc_id)
    }
}

#[async_trait]
impl SubnetApi for FakeEc2 {
    async fn create_subnet(&self, input: CreateSubnetInput) -> Result<String, ApiError> {
        self.record("CreateSubnet", &input)?;
        Ok("subnet-new".into())
    }

    async fn describe_subnets(
        &self,
        subnet_ids: Vec<String>,
    ) -> Result<Vec<SubnetDescription>, ApiError> {
        self.record("DescribeSubnets", &subnet_ids)?;
        Ok(self.subnets.next())
    }

    async fn modify_subnet_attribute(
        &self,
        input: ModifySubnetAttributeInput,
    ) -> Result<(), ApiError> {
        self.record("ModifySubnetAttribute", &input)
    }

    async fn delete_subnet(&self, subnet_id: String) -> Result<(), ApiError> {
        self.record("DeleteSubnet", &subnet_id)
    }
}

#[async_trait]
impl VpcEndpointApi for FakeEc2 {
    async fn create_vpc_endpoint(
        &self,
        input: CreateVpcEndpointInput,
    ) -> Result<VpcEndpointDescription, ApiError> {
        self.record("CreateVpcEndpoint", &input)?;
        Ok(VpcEndpointDescription {
            vpc_endpoint_id: "vpce-new".into(),
            state: Some("pending".into()),
            ..Default::default()
        })
    }

    async fn describe_vpc_endpoints(
        &self,
        vpc_endpoint_ids: Vec<String>,
    ) -> Result<Vec<VpcEndpointDescription>, ApiError> {
        self.record("DescribeVpcEndpoints", &vpc_endpoint_ids)?;
        Ok(self.vpc_endpoints.next())
    }

    async fn modify_vpc_endpoint(&self, input: ModifyVpcEndpointInput) -> Result<(), ApiError> {
        self.record("ModifyVpcEndpoint", &input)
    }

    async fn delete_vpc_endpoints(&self, vpc_endpoint_ids: Vec<String>) -> Result<(), ApiError> {
        self.record("DeleteVpcEndpoints", &vpc_endpoint_ids)
    }
}

#[async_trait]
impl InternetGatewayApi for FakeEc2 {
    async fn create_internet_gateway(
        &self,
        input: CreateInternetGatewayInput,
    ) -> Result<String, ApiError> {
        self.record("CreateInternetGateway", &input)?;
        Ok("igw-new".into())
    }

    async fn describe_internet_gateways(
        &self,
        internet_gateway_ids: Vec<String>,
    ) -> Result<Vec<InternetGatewayDescription>, ApiError> {
        self.record("DescribeInternetGateways", &internet_gateway_ids)?;
        Ok(self.internet_gateways.next())
    }

    async fn attach_internet_gateway(
        &self,
        input: InternetGatewayAttachmentInput,
    ) -> Result<(), ApiError> {
        self.record("AttachInternetGateway", &input)
    }

    async fn detach_internet_gateway(
        &self,
        input: InternetGatewayAttachmentInput,
    ) -> Result<(), ApiError> {
        self.record("DetachInternetGateway", &input)
    }

    async fn delete_internet_gateway(&self, internet_gateway_id: String) -> Result<(), ApiError> {
        self.record("DeleteInternetGateway", &internet_gateway_id)
    }
}
