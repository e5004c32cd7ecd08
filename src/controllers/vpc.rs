use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, Span};

use super::security_group::describe_rules;
use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    AssociateVpcCidrBlockInput, CreateVpcInput, DescribeSecurityGroupsInput,
    DescribeVpcAttributeInput, Filter, ModifyVpcAttributeInput, SecurityGroupApi,
    SecurityGroupPermissionsInput, TagsApi, VpcApi, VpcAttribute, VpcDescription,
};
use crate::reconcilers::{apply_delta, compute_delta, diff, Mutator};
use crate::resources::object;
use crate::resources::security_group::{IpPermission, SecurityGroupRule, UserIdGroupPair};
use crate::resources::vpc::{Vpc, VpcSpec, VpcStatus};
use crate::{telemetry, Error, OpType, Result};

/// Name EC2 gives the security group it creates with every VPC.
const DEFAULT_GROUP_NAME: &str = "default";

pub struct VpcManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> VpcManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

/// Associates and releases secondary IPv4 blocks.
struct CidrMutator<'a, C> {
    ctx: &'a Context<C>,
    cancel: &'a CancellationToken,
    vpc_id: &'a str,
    status: Option<&'a VpcStatus>,
}

#[async_trait]
impl<'a, C: VpcApi> Mutator<String> for CidrMutator<'a, C> {
    async fn delete(&self, items: Vec<String>) -> Result<()> {
        for cidr in items {
            let Some(association_id) = self.status.and_then(|s| s.association_id(&cidr)) else {
                debug!(%cidr, "No association to release");
                continue;
            };
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "DisassociateVpcCidrBlock",
                    self.ctx
                        .client
                        .disassociate_vpc_cidr_block(association_id.to_string()),
                )
                .await
                .or_else(|e| match not_found(e) {
                    Error::NotFound => Ok(()),
                    e => Err(e),
                })?;
        }
        Ok(())
    }

    async fn add(&self, items: Vec<String>) -> Result<()> {
        for cidr_block in items {
            let input = AssociateVpcCidrBlockInput {
                vpc_id: self.vpc_id.to_string(),
                cidr_block,
            };
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "AssociateVpcCidrBlock",
                    self.ctx.client.associate_vpc_cidr_block(input),
                )
                .await?;
        }
        Ok(())
    }
}

fn vpc_id(resource: &Vpc) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "vpcID")
}

fn status(vpc: &VpcDescription, default_rules_exist: Option<bool>) -> VpcStatus {
    VpcStatus {
        id: Some(vpc.vpc_id.clone()),
        owner_id: vpc.owner_id.clone(),
        state: vpc.state.clone(),
        dhcp_options_id: vpc.dhcp_options_id.clone(),
        is_default: vpc.is_default,
        cidr_block_association_set: vpc.cidr_block_association_set.clone(),
        security_group_default_rules_exist: default_rules_exist,
    }
}

/// The all-traffic rules EC2 puts in a VPC's default group: ingress from the
/// group itself and egress to 0.0.0.0/0.
fn is_default_rule(rule: &SecurityGroupRule, group_id: &str) -> bool {
    let all_traffic = rule.ip_protocol.as_deref() == Some("-1")
        && rule.from_port == Some(-1)
        && rule.to_port == Some(-1);
    let peer = if rule.is_egress.unwrap_or_default() {
        rule.cidr_ipv4.as_deref() == Some("0.0.0.0/0")
    } else {
        rule.referenced_group_id.as_deref() == Some(group_id)
    };
    all_traffic && peer
}

/// EC2 refuses to disable DNS support while hostnames are enabled, and to
/// enable hostnames without DNS support.
fn dns_modifications(desired: &VpcSpec, latest: &VpcSpec) -> Vec<ModifyVpcAttributeInput> {
    let support = desired
        .enable_dns_support
        .filter(|v| latest.enable_dns_support != Some(*v))
        .map(|v| ModifyVpcAttributeInput {
            enable_dns_support: Some(v),
            ..Default::default()
        });
    let hostnames = desired
        .enable_dns_hostnames
        .filter(|v| latest.enable_dns_hostnames != Some(*v))
        .map(|v| ModifyVpcAttributeInput {
            enable_dns_hostnames: Some(v),
            ..Default::default()
        });
    if desired.enable_dns_hostnames == Some(false) {
        hostnames.into_iter().chain(support).collect()
    } else {
        support.into_iter().chain(hostnames).collect()
    }
}

impl<C: VpcApi + SecurityGroupApi> VpcManager<C> {
    async fn attribute(
        &self,
        vpc_id: &str,
        attribute: VpcAttribute,
        cancel: &CancellationToken,
    ) -> Result<Option<bool>> {
        let input = DescribeVpcAttributeInput {
            vpc_id: vpc_id.to_string(),
            attribute,
        };
        self.ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeVpcAttribute",
                self.ctx.client.describe_vpc_attribute(input),
            )
            .await
    }

    async fn default_group_id(
        &self,
        vpc_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let input = DescribeSecurityGroupsInput {
            filters: vec![
                Filter::new("vpc-id", vpc_id),
                Filter::new("group-name", DEFAULT_GROUP_NAME),
            ],
            ..Default::default()
        };
        let groups = self
            .ctx
            .call(
                cancel,
                OpType::ReadMany,
                "DescribeSecurityGroups",
                self.ctx.client.describe_security_groups(input),
            )
            .await?;
        Ok(groups.into_iter().next().map(|g| g.group_id))
    }

    async fn default_rules_exist(&self, vpc_id: &str, cancel: &CancellationToken) -> Result<bool> {
        let Some(group_id) = self.default_group_id(vpc_id, cancel).await? else {
            return Ok(false);
        };
        let rules = describe_rules(&self.ctx, &group_id, cancel).await?;
        Ok(rules.iter().any(|r| is_default_rule(r, &group_id)))
    }

    /// Revoke both default rules. A rule that is already gone is not an error.
    async fn remove_default_rules(&self, vpc_id: &str, cancel: &CancellationToken) -> Result<()> {
        let Some(group_id) = self.default_group_id(vpc_id, cancel).await? else {
            return Ok(());
        };
        let egress = SecurityGroupPermissionsInput {
            group_id: group_id.clone(),
            ip_permissions: vec![IpPermission::default_egress()],
        };
        self.ctx
            .call(
                cancel,
                OpType::Update,
                "RevokeSecurityGroupEgress",
                self.ctx.client.revoke_security_group_egress(egress),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        let ingress = SecurityGroupPermissionsInput {
            group_id: group_id.clone(),
            ip_permissions: vec![IpPermission {
                user_id_group_pairs: vec![UserIdGroupPair {
                    group_id: Some(group_id),
                    ..Default::default()
                }],
                ..IpPermission::all_traffic()
            }],
        };
        self.ctx
            .call(
                cancel,
                OpType::Update,
                "RevokeSecurityGroupIngress",
                self.ctx.client.revoke_security_group_ingress(ingress),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        info!(%vpc_id, "Removed default security group rules");
        Ok(())
    }

    async fn modify_dns(
        &self,
        desired: &VpcSpec,
        latest: &VpcSpec,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for input in dns_modifications(desired, latest) {
            let input = ModifyVpcAttributeInput {
                vpc_id: id.to_string(),
                ..input
            };
            self.ctx
                .call(
                    cancel,
                    OpType::Update,
                    "ModifyVpcAttribute",
                    self.ctx.client.modify_vpc_attribute(input),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: VpcApi + SecurityGroupApi + TagsApi> ResourceManager for VpcManager<C> {
    type Spec = VpcSpec;
    type Status = VpcStatus;

    const KIND: &'static str = "VPC";

    /// Default security group rules are only inspected when the resource asks
    /// for them to be removed.
    #[instrument(skip_all, fields(trace_id))]
    async fn find(&self, resource: &Vpc, cancel: &CancellationToken) -> Result<Vpc> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = vpc_id(resource).map_err(|_| Error::NotFound)?;
        let vpcs = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeVpcs",
                self.ctx.client.describe_vpcs(vec![Filter::new("vpc-id", id)]),
            )
            .await
            .map_err(not_found)?;
        let vpc = single(vpcs)?;
        let enable_dns_support = self
            .attribute(id, VpcAttribute::EnableDnsSupport, cancel)
            .await?;
        let enable_dns_hostnames = self
            .attribute(id, VpcAttribute::EnableDnsHostnames, cancel)
            .await?;
        let disallow = resource.spec.disallow_security_group_default_rules;
        let default_rules_exist = match disallow {
            Some(true) => Some(self.default_rules_exist(id, cancel).await?),
            _ => None,
        };

        let status = status(&vpc, default_rules_exist);
        let spec = VpcSpec {
            cidr_blocks: vpc
                .cidr_block_association_set
                .iter()
                .filter(|a| a.is_associated())
                .filter_map(|a| a.cidr_block.clone())
                .collect(),
            enable_dns_support,
            enable_dns_hostnames,
            instance_tenancy: vpc.instance_tenancy,
            disallow_security_group_default_rules: default_rules_exist.map(|e| !e).or(disallow),
            tags: vpc.tags,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    /// Default security group rules are left to the first update.
    #[instrument(skip_all, fields(trace_id))]
    async fn create(&self, desired: &Vpc, cancel: &CancellationToken) -> Result<Vpc> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let Some((primary, secondary)) = desired.spec.cidr_blocks.split_first() else {
            return Err(Error::invalid(Self::KIND, "at least one CIDR block is required"));
        };
        let input = CreateVpcInput {
            cidr_block: primary.clone(),
            instance_tenancy: desired.spec.instance_tenancy.clone(),
            tags: desired.spec.tags.clone(),
        };
        let vpc = self
            .ctx
            .call(cancel, OpType::Create, "CreateVpc", self.ctx.client.create_vpc(input))
            .await?;
        info!(vpc_id = %vpc.vpc_id, "Created VPC");

        let blocks = CidrMutator {
            ctx: &self.ctx,
            cancel,
            vpc_id: &vpc.vpc_id,
            status: None,
        };
        if !secondary.is_empty() {
            blocks.add(secondary.to_vec()).await?;
        }
        self.modify_dns(&desired.spec, &VpcSpec::default(), &vpc.vpc_id, cancel)
            .await?;

        // the next pass's find refreshes the rest of the state
        let mut created = desired.clone();
        created.status = Some(status(&vpc, None));
        Ok(created)
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn update(&self, desired: &Vpc, latest: &Vpc, cancel: &CancellationToken) -> Result<Vpc> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = vpc_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if delta.different_at("instanceTenancy") {
            return Err(Error::Terminal(
                "VPC instanceTenancy cannot be changed after creation".into(),
            ));
        }
        if delta.different_at("cidrBlocks") {
            // find lists the primary block first
            if let Some(primary) = latest.spec.cidr_blocks.first() {
                if !desired.spec.cidr_blocks.contains(primary) {
                    return Err(Error::Terminal(format!(
                        "primary CIDR block {primary} cannot be removed"
                    )));
                }
            }
            let blocks = CidrMutator {
                ctx: &self.ctx,
                cancel,
                vpc_id: id,
                status: latest.status.as_ref(),
            };
            let delta = compute_delta(&desired.spec.cidr_blocks, &latest.spec.cidr_blocks)?;
            apply_delta(&blocks, delta).await?;
        }
        if delta.different_at("disallowSecurityGroupDefaultRules")
            && desired.spec.disallow_security_group_default_rules == Some(true)
        {
            self.remove_default_rules(id, cancel).await?;
        }
        self.modify_dns(&desired.spec, &latest.spec, id, cancel)
            .await?;
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }

        let mut observed = latest.clone();
        observed.spec.disallow_security_group_default_rules =
            desired.spec.disallow_security_group_default_rules;
        self.find(&observed, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn delete(&self, latest: &Vpc, cancel: &CancellationToken) -> Result<Vpc> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = vpc_id(latest)?;
        self.ctx
            .call(cancel, OpType::Delete, "DeleteVpc", self.ctx.client.delete_vpc(id.to_string()))
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
