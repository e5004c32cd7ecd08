use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    CreateSecurityGroupInput, DescribeSecurityGroupRulesInput, DescribeSecurityGroupsInput,
    Filter, SecurityGroupApi, SecurityGroupPermissionsInput, TagsApi,
};
use crate::reconcilers::{compute_delta, diff, Mutator};
use crate::resources::security_group::{
    flatten, IpPermission, SecurityGroup, SecurityGroupRule, SecurityGroupSpec, SecurityGroupStatus,
};
use crate::resources::object;
use crate::{telemetry, Error, OpType, Result};

pub struct SecurityGroupManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> SecurityGroupManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Ingress,
    Egress,
}

/// Authorizes and revokes one direction of rules, `rule_batch_size`
/// permissions per call.
struct RuleMutator<'a, C> {
    ctx: &'a Context<C>,
    cancel: &'a CancellationToken,
    group_id: &'a str,
    direction: Direction,
}

impl<'a, C: SecurityGroupApi> RuleMutator<'a, C> {
    fn batches(&self, items: Vec<IpPermission>) -> Vec<SecurityGroupPermissionsInput> {
        items
            .chunks(self.ctx.config.rule_batch_size.max(1))
            .map(|chunk| SecurityGroupPermissionsInput {
                group_id: self.group_id.to_string(),
                ip_permissions: chunk.to_vec(),
            })
            .collect()
    }
}

#[async_trait]
impl<'a, C: SecurityGroupApi> Mutator<IpPermission> for RuleMutator<'a, C> {
    async fn delete(&self, items: Vec<IpPermission>) -> Result<()> {
        for input in self.batches(items) {
            match self.direction {
                Direction::Ingress => {
                    let call = self.ctx.client.revoke_security_group_ingress(input);
                    self.ctx
                        .call(self.cancel, OpType::Update, "RevokeSecurityGroupIngress", call)
                        .await?
                }
                Direction::Egress => {
                    let call = self.ctx.client.revoke_security_group_egress(input);
                    self.ctx
                        .call(self.cancel, OpType::Update, "RevokeSecurityGroupEgress", call)
                        .await?
                }
            }
        }
        Ok(())
    }

    async fn add(&self, items: Vec<IpPermission>) -> Result<()> {
        for input in self.batches(items) {
            match self.direction {
                Direction::Ingress => {
                    let call = self.ctx.client.authorize_security_group_ingress(input);
                    self.ctx
                        .call(self.cancel, OpType::Update, "AuthorizeSecurityGroupIngress", call)
                        .await?
                }
                Direction::Egress => {
                    let call = self.ctx.client.authorize_security_group_egress(input);
                    self.ctx
                        .call(self.cancel, OpType::Update, "AuthorizeSecurityGroupEgress", call)
                        .await?
                }
            }
        }
        Ok(())
    }
}

/// Rule sets in the shape they are diffed in: one peer per permission,
/// group pairs pointing at this group by default, and the AWS default egress
/// rule dropped from `latest` when no egress is desired.
fn comparable(
    desired: &SecurityGroupSpec,
    latest: &SecurityGroupSpec,
    group_id: &str,
) -> (SecurityGroupSpec, SecurityGroupSpec) {
    let vpc_id = desired.vpc_id.as_deref().or(latest.vpc_id.as_deref());
    let with_defaults = |rules: &[IpPermission]| -> Vec<IpPermission> {
        flatten(rules)
            .into_iter()
            .map(|r| r.with_group_defaults(group_id, vpc_id))
            .collect()
    };
    let desired = SecurityGroupSpec {
        ingress_rules: with_defaults(&desired.ingress_rules),
        egress_rules: with_defaults(&desired.egress_rules),
        ..desired.clone()
    };
    let mut latest_egress = flatten(&latest.egress_rules);
    if desired.egress_rules.is_empty() {
        latest_egress.retain(|r| !is_default_egress(r));
    }
    let latest = SecurityGroupSpec {
        ingress_rules: flatten(&latest.ingress_rules),
        egress_rules: latest_egress,
        ..latest.clone()
    };
    (desired, latest)
}

/// All traffic to 0.0.0.0/0. Ports and the range description are not
/// considered since EC2 omits them for protocol -1.
fn is_default_egress(rule: &IpPermission) -> bool {
    let default = IpPermission::default_egress();
    rule.ip_protocol == default.ip_protocol
        && rule.ip_ranges.len() == 1
        && rule.ip_ranges[0].cidr_ip == default.ip_ranges[0].cidr_ip
        && rule.ipv6_ranges.is_empty()
        && rule.prefix_list_ids.is_empty()
        && rule.user_id_group_pairs.is_empty()
}

/// Every rule of the group, following `NextToken` to the last page.
pub(crate) async fn describe_rules<C: SecurityGroupApi>(
    ctx: &Context<C>,
    group_id: &str,
    cancel: &CancellationToken,
) -> Result<Vec<SecurityGroupRule>> {
    let mut rules = Vec::new();
    let mut next_token = None;
    loop {
        let input = DescribeSecurityGroupRulesInput {
            filters: vec![Filter::new("group-id", group_id)],
            next_token,
        };
        let page = ctx
            .call(
                cancel,
                OpType::ReadMany,
                "DescribeSecurityGroupRules",
                ctx.client.describe_security_group_rules(input),
            )
            .await?;
        rules.extend(page.rules);
        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }
    Ok(rules)
}

impl<C: SecurityGroupApi + TagsApi> SecurityGroupManager<C> {
    async fn sync_rules(
        &self,
        desired: &SecurityGroupSpec,
        latest: &SecurityGroupSpec,
        group_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let ingress = compute_delta(&desired.ingress_rules, &latest.ingress_rules)?;
        let egress = compute_delta(&desired.egress_rules, &latest.egress_rules)?;
        debug!(
            ingress = ingress.len(),
            egress = egress.len(),
            "Syncing security group rules"
        );
        let mutator = |direction| RuleMutator {
            ctx: &self.ctx,
            cancel,
            group_id,
            direction,
        };
        let ingress_rules = mutator(Direction::Ingress);
        let egress_rules = mutator(Direction::Egress);

        // every revoke is issued before any authorize
        let revokes = [(&ingress_rules, ingress.to_delete), (&egress_rules, egress.to_delete)];
        for (rules, items) in revokes {
            if !items.is_empty() {
                rules.delete(items).await?;
            }
        }
        for (rules, items) in [(&ingress_rules, ingress.to_add), (&egress_rules, egress.to_add)] {
            if !items.is_empty() {
                rules.add(items).await?;
            }
        }
        Ok(())
    }
}

fn group_id(resource: &SecurityGroup) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "id")
}

#[async_trait]
impl<C: SecurityGroupApi + TagsApi> ResourceManager for SecurityGroupManager<C> {
    type Spec = SecurityGroupSpec;
    type Status = SecurityGroupStatus;

    const KIND: &'static str = "SecurityGroup";

    #[instrument(skip_all, fields(trace_id))]
    async fn find(
        &self,
        resource: &SecurityGroup,
        cancel: &CancellationToken,
    ) -> Result<SecurityGroup> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = group_id(resource).map_err(|_| Error::NotFound)?.to_string();
        let groups = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeSecurityGroups",
                self.ctx.client.describe_security_groups(DescribeSecurityGroupsInput {
                    group_ids: vec![id.clone()],
                    ..Default::default()
                }),
            )
            .await
            .map_err(not_found)?;
        let group = single(groups)?;
        let rules = describe_rules(&self.ctx, &id, cancel).await?;

        let spec = SecurityGroupSpec {
            name: group.group_name,
            description: group.description,
            vpc_id: group.vpc_id,
            ingress_rules: group.ip_permissions,
            egress_rules: group.ip_permissions_egress,
            tags: group.tags,
        };
        let status = SecurityGroupStatus {
            id: Some(group.group_id),
            owner_id: group.owner_id,
            rules,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(
        &self,
        desired: &SecurityGroup,
        cancel: &CancellationToken,
    ) -> Result<SecurityGroup> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateSecurityGroupInput {
            group_name: desired.spec.name.clone(),
            description: desired.spec.description.clone(),
            vpc_id: desired.spec.vpc_id.clone(),
            tags: desired.spec.tags.clone(),
        };
        let id = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateSecurityGroup",
                self.ctx.client.create_security_group(input),
            )
            .await?;
        info!(group_id = %id, "Created security group");

        let mut created = desired.clone();
        created.status = Some(SecurityGroupStatus {
            id: Some(id.clone()),
            ..Default::default()
        });
        let latest = self.find(&created, cancel).await?;
        let (desired_spec, latest_spec) = comparable(&desired.spec, &latest.spec, &id);
        self.sync_rules(&desired_spec, &latest_spec, &id, cancel).await?;
        self.find(&latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &SecurityGroup,
        latest: &SecurityGroup,
        cancel: &CancellationToken,
    ) -> Result<SecurityGroup> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = group_id(latest)?;
        let (desired_spec, latest_spec) = comparable(&desired.spec, &latest.spec, id);
        let delta = diff(&desired_spec, &latest_spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        for immutable in ["name", "description", "vpcID"] {
            if delta.different_at(immutable) {
                return Err(Error::Terminal(format!(
                    "security group {immutable} cannot be changed after creation"
                )));
            }
        }

        if delta.different_at("ingressRules") || delta.different_at("egressRules") {
            self.sync_rules(&desired_spec, &latest_spec, id, cancel).await?;
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        self.find(latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn delete(
        &self,
        latest: &SecurityGroup,
        cancel: &CancellationToken,
    ) -> Result<SecurityGroup> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = group_id(latest)?;
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteSecurityGroup",
                self.ctx.client.delete_security_group(id.to_string()),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
