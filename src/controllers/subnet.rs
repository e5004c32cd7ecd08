use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{field, info, instrument, Span};

use super::route_table::{
    associated_route_tables, describe_associations, sync_associations, Associated,
};
use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{CreateSubnetInput, ModifySubnetAttributeInput, RouteTableApi, SubnetApi, TagsApi};
use crate::reconcilers::diff;
use crate::resources::object;
use crate::resources::subnet::{Subnet, SubnetSpec, SubnetStatus};
use crate::{telemetry, Error, OpType, Result};

pub struct SubnetManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> SubnetManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

fn subnet_id(resource: &Subnet) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "subnetID")
}

/// One input per attribute that differs from `latest`.
fn attribute_modifications(
    desired: &SubnetSpec,
    latest: &SubnetSpec,
) -> Vec<ModifySubnetAttributeInput> {
    let public_ip = desired
        .map_public_ip_on_launch
        .filter(|v| latest.map_public_ip_on_launch != Some(*v))
        .map(|v| ModifySubnetAttributeInput {
            map_public_ip_on_launch: Some(v),
            ..Default::default()
        });
    let ipv6 = desired
        .assign_ipv6_address_on_creation
        .filter(|v| latest.assign_ipv6_address_on_creation != Some(*v))
        .map(|v| ModifySubnetAttributeInput {
            assign_ipv6_address_on_creation: Some(v),
            ..Default::default()
        });
    public_ip.into_iter().chain(ipv6).collect()
}

impl<C: SubnetApi> SubnetManager<C> {
    async fn modify_attributes(
        &self,
        desired: &SubnetSpec,
        latest: &SubnetSpec,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for input in attribute_modifications(desired, latest) {
            let input = ModifySubnetAttributeInput {
                subnet_id: id.to_string(),
                ..input
            };
            self.ctx
                .call(
                    cancel,
                    OpType::Update,
                    "ModifySubnetAttribute",
                    self.ctx.client.modify_subnet_attribute(input),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: SubnetApi + RouteTableApi + TagsApi> ResourceManager for SubnetManager<C> {
    type Spec = SubnetSpec;
    type Status = SubnetStatus;

    const KIND: &'static str = "Subnet";

    /// Route tables are those explicitly associated with the subnet.
    #[instrument(skip_all, fields(trace_id))]
    async fn find(&self, resource: &Subnet, cancel: &CancellationToken) -> Result<Subnet> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = subnet_id(resource).map_err(|_| Error::NotFound)?;
        let subnets = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeSubnets",
                self.ctx.client.describe_subnets(vec![id.to_string()]),
            )
            .await
            .map_err(not_found)?;
        let subnet = single(subnets)?;
        let associations = describe_associations(&self.ctx, cancel, Associated::Subnet(id)).await?;

        let spec = SubnetSpec {
            availability_zone: subnet.availability_zone,
            cidr_block: subnet.cidr_block,
            ipv6_cidr_block: subnet.ipv6_cidr_block,
            vpc_id: subnet.vpc_id,
            map_public_ip_on_launch: subnet.map_public_ip_on_launch,
            assign_ipv6_address_on_creation: subnet.assign_ipv6_address_on_creation,
            route_tables: Some(associated_route_tables(&associations)),
            tags: subnet.tags,
        };
        let status = SubnetStatus {
            id: Some(subnet.subnet_id),
            owner_id: subnet.owner_id,
            state: subnet.state,
            available_ip_address_count: subnet.available_ip_address_count,
            route_table_associations: associations,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(&self, desired: &Subnet, cancel: &CancellationToken) -> Result<Subnet> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateSubnetInput {
            vpc_id: desired.spec.vpc_id.clone(),
            cidr_block: desired.spec.cidr_block.clone(),
            ipv6_cidr_block: desired.spec.ipv6_cidr_block.clone(),
            availability_zone: desired.spec.availability_zone.clone(),
            tags: desired.spec.tags.clone(),
        };
        let id = self
            .ctx
            .call(cancel, OpType::Create, "CreateSubnet", self.ctx.client.create_subnet(input))
            .await?;
        info!(subnet_id = %id, "Created subnet");

        self.modify_attributes(&desired.spec, &SubnetSpec::default(), &id, cancel)
            .await?;
        let target = Associated::Subnet(&id);
        sync_associations(&self.ctx, cancel, target, &desired.spec.route_tables, &[]).await?;

        // the next pass's find refreshes the rest of the state
        let mut created = desired.clone();
        created.status = Some(SubnetStatus {
            id: Some(id),
            ..Default::default()
        });
        Ok(created)
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &Subnet,
        latest: &Subnet,
        cancel: &CancellationToken,
    ) -> Result<Subnet> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = subnet_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        for immutable in ["availabilityZone", "cidrBlock", "ipv6CIDRBlock", "vpcID"] {
            if delta.different_at(immutable) {
                return Err(Error::Terminal(format!(
                    "subnet {immutable} cannot be changed after creation"
                )));
            }
        }

        self.modify_attributes(&desired.spec, &latest.spec, id, cancel)
            .await?;
        if delta.different_at("routeTables") {
            let associations = latest
                .status
                .as_ref()
                .map(|s| s.route_table_associations.as_slice())
                .unwrap_or_default();
            let target = Associated::Subnet(id);
            sync_associations(&self.ctx, cancel, target, &desired.spec.route_tables, associations)
                .await?;
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        self.find(latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn delete(&self, latest: &Subnet, cancel: &CancellationToken) -> Result<Subnet> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = subnet_id(latest)?;
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteSubnet",
                self.ctx.client.delete_subnet(id.to_string()),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::controllers::test_support::{context, resource};
    use crate::ec2::{RouteTableDescription, SubnetDescription};
    use crate::resources::route_table::RouteTableAssociation;

    fn association(route_table_id: &str, subnet_id: &str) -> RouteTableAssociation {
        RouteTableAssociation {
            id: Some(format!("rtbassoc-{route_table_id}")),
            route_table_id: Some(route_table_id.into()),
            subnet_id: Some(subnet_id.into()),
            state: Some("associated".into()),
            ..Default::default()
        }
    }

    fn table(id: &str, associations: Vec<RouteTableAssociation>) -> RouteTableDescription {
        RouteTableDescription {
            route_table_id: id.into(),
            vpc_id: Some("vpc-1".into()),
            associations,
            ..Default::default()
        }
    }

    fn subnet(route_tables: Option<&[&str]>) -> Subnet {
        let route_tables: Option<Vec<String>> =
            route_tables.map(|ids| ids.iter().map(|id| id.to_string()).collect());
        let associations: Vec<RouteTableAssociation> = route_tables
            .iter()
            .flatten()
            .map(|id| association(id, "subnet-1"))
            .collect();
        resource(
            SubnetSpec {
                vpc_id: Some("vpc-1".into()),
                cidr_block: Some("10.0.1.0/24".into()),
                route_tables,
                ..Default::default()
            },
            Some(SubnetStatus {
                id: Some("subnet-1".into()),
                route_table_associations: associations,
                ..Default::default()
            }),
        )
    }

    fn described() -> Vec<SubnetDescription> {
        vec![SubnetDescription {
            subnet_id: "subnet-1".into(),
            vpc_id: Some("vpc-1".into()),
            cidr_block: Some("10.0.1.0/24".into()),
            availability_zone: Some("us-west-2a".into()),
            ..Default::default()
        }]
    }

    #[tokio::test]
    async fn test_route_table_is_swapped() {
        let ctx = context();
        ctx.client.push_subnets(described());
        let manager = SubnetManager::new(ctx.clone());
        manager
            .update(&subnet(Some(&["rtb-2"])), &subnet(Some(&["rtb-1"])), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            ctx.client.mutations(),
            vec!["DisassociateRouteTable", "AssociateRouteTable"]
        );
        assert_eq!(ctx.client.inputs("DisassociateRouteTable"), vec![json!("rtbassoc-rtb-1")]);
        assert_eq!(
            ctx.client.inputs("AssociateRouteTable"),
            vec![json!({"RouteTableId": "rtb-2", "SubnetId": "subnet-1", "GatewayId": null})]
        );
    }

    #[tokio::test]
    async fn test_find_reads_explicit_associations() {
        let ctx = context();
        ctx.client.push_subnets(described());
        ctx.client.push_route_tables(vec![
            table("rtb-1", vec![association("rtb-1", "subnet-1")]),
            table("rtb-2", vec![association("rtb-2", "subnet-2")]),
            table(
                "rtb-main",
                vec![RouteTableAssociation {
                    id: Some("rtbassoc-main".into()),
                    route_table_id: Some("rtb-main".into()),
                    main: Some(true),
                    ..Default::default()
                }],
            ),
        ]);
        let manager = SubnetManager::new(ctx.clone());
        let found = manager
            .find(&subnet(None), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(found.spec.route_tables, Some(vec!["rtb-1".to_string()]));
        assert_eq!(found.spec.availability_zone.as_deref(), Some("us-west-2a"));
        assert_eq!(
            ctx.client.inputs("DescribeRouteTables")[0]["Filters"],
            json!([{"name": "association.subnet-id", "values": ["subnet-1"]}])
        );
    }

    #[tokio::test]
    async fn test_unset_route_tables_are_not_managed() {
        let ctx = context();
        let manager = SubnetManager::new(ctx.clone());
        let mut latest = subnet(Some(&["rtb-1"]));
        latest.spec.availability_zone = Some("us-west-2a".into());
        latest.spec.map_public_ip_on_launch = Some(false);
        manager
            .update(&subnet(None), &latest, &CancellationToken::new())
            .await
            .unwrap();
        assert!(ctx.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_zone_change_is_terminal() {
        let ctx = context();
        let manager = SubnetManager::new(ctx.clone());
        let mut desired = subnet(None);
        desired.spec.availability_zone = Some("us-west-2b".into());
        let mut latest = subnet(None);
        latest.spec.availability_zone = Some("us-west-2a".into());
        let err = manager
            .update(&desired, &latest, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_terminal());
        assert!(ctx.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_sets_attributes_and_associates() {
        let ctx = context();
        let manager = SubnetManager::new(ctx.clone());
        let mut desired = subnet(Some(&["rtb-1"]));
        desired.status = None;
        desired.spec.map_public_ip_on_launch = Some(true);
        let created = manager
            .create(&desired, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(created.status.unwrap().id.as_deref(), Some("subnet-new"));
        assert_eq!(
            ctx.client.mutations(),
            vec!["CreateSubnet", "ModifySubnetAttribute", "AssociateRouteTable"]
        );
        assert_eq!(
            ctx.client.inputs("ModifySubnetAttribute"),
            vec![json!({
                "SubnetId": "subnet-new",
                "MapPublicIpOnLaunch": true,
                "AssignIpv6AddressOnCreation": null,
            })]
        );
    }
}
