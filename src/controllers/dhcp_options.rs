use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    AssociateDhcpOptionsInput, CreateDhcpOptionsInput, DhcpOptionsApi, Filter, TagsApi, VpcApi,
};
use crate::reconcilers::{apply_delta, compute_delta, diff, Mutator};
use crate::resources::dhcp_options::{
    DhcpOptions, DhcpOptionsSpec, DhcpOptionsStatus, DEFAULT_DHCP_OPTIONS,
};
use crate::resources::object;
use crate::{telemetry, Error, OpType, Result};

pub struct DhcpOptionsManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> DhcpOptionsManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

/// Attaches VPCs to the options set; detached VPCs fall back to `default`.
struct VpcMutator<'a, C> {
    ctx: &'a Context<C>,
    cancel: &'a CancellationToken,
    dhcp_options_id: &'a str,
}

impl<'a, C: DhcpOptionsApi> VpcMutator<'a, C> {
    async fn associate(&self, dhcp_options_id: &str, vpcs: Vec<String>) -> Result<()> {
        for vpc_id in vpcs {
            let input = AssociateDhcpOptionsInput {
                dhcp_options_id: dhcp_options_id.to_string(),
                vpc_id,
            };
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "AssociateDhcpOptions",
                    self.ctx.client.associate_dhcp_options(input),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<'a, C: DhcpOptionsApi> Mutator<String> for VpcMutator<'a, C> {
    async fn delete(&self, items: Vec<String>) -> Result<()> {
        self.associate(DEFAULT_DHCP_OPTIONS, items).await
    }

    async fn add(&self, items: Vec<String>) -> Result<()> {
        self.associate(self.dhcp_options_id, items).await
    }
}

fn dhcp_options_id(resource: &DhcpOptions) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "dhcpOptionsID")
}

impl<C: DhcpOptionsApi> DhcpOptionsManager<C> {
    async fn sync_vpcs(
        &self,
        desired: &[String],
        latest: &[String],
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let delta = compute_delta(desired, latest)?;
        let mutator = VpcMutator {
            ctx: &self.ctx,
            cancel,
            dhcp_options_id: id,
        };
        apply_delta(&mutator, delta).await
    }
}

#[async_trait]
impl<C: DhcpOptionsApi + VpcApi + TagsApi> ResourceManager for DhcpOptionsManager<C> {
    type Spec = DhcpOptionsSpec;
    type Status = DhcpOptionsStatus;

    const KIND: &'static str = "DHCPOptions";

    /// The associated VPCs are those whose `dhcp-options-id` is this set.
    #[instrument(skip_all, fields(trace_id))]
    async fn find(
        &self,
        resource: &DhcpOptions,
        cancel: &CancellationToken,
    ) -> Result<DhcpOptions> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = dhcp_options_id(resource).map_err(|_| Error::NotFound)?;
        let sets = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeDhcpOptions",
                self.ctx.client.describe_dhcp_options(vec![id.to_string()]),
            )
            .await
            .map_err(not_found)?;
        let set = single(sets)?;
        let vpcs = self
            .ctx
            .call(
                cancel,
                OpType::ReadMany,
                "DescribeVpcs",
                self.ctx.client.describe_vpcs(vec![Filter::new("dhcp-options-id", id)]),
            )
            .await?;

        let spec = DhcpOptionsSpec {
            dhcp_configurations: set.dhcp_configurations,
            vpc: vpcs.into_iter().map(|v| v.vpc_id).collect(),
            tags: set.tags,
        };
        let status = DhcpOptionsStatus {
            id: Some(set.dhcp_options_id),
            owner_id: set.owner_id,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(
        &self,
        desired: &DhcpOptions,
        cancel: &CancellationToken,
    ) -> Result<DhcpOptions> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateDhcpOptionsInput {
            dhcp_configurations: desired.spec.dhcp_configurations.clone(),
            tags: desired.spec.tags.clone(),
        };
        let id = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateDhcpOptions",
                self.ctx.client.create_dhcp_options(input),
            )
            .await?;
        info!(dhcp_options_id = %id, "Created DHCP options");

        self.sync_vpcs(&desired.spec.vpc, &[], &id, cancel).await?;
        let mut created = desired.clone();
        created.status = Some(DhcpOptionsStatus {
            id: Some(id),
            ..Default::default()
        });
        self.find(&created, cancel).await
    }

    /// Configurations cannot be modified after creation; only VPC
    /// associations and tags are reconciled.
    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &DhcpOptions,
        latest: &DhcpOptions,
        cancel: &CancellationToken,
    ) -> Result<DhcpOptions> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = dhcp_options_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if delta.different_at("dhcpConfigurations") {
            return Err(Error::Terminal(
                "DHCP options configurations cannot be changed after creation".into(),
            ));
        }
        if delta.different_at("vpc") {
            self.sync_vpcs(&desired.spec.vpc, &latest.spec.vpc, id, cancel).await?;
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        self.find(latest, cancel).await
    }

    /// VPCs still using the set are moved to `default` first.
    #[instrument(skip_all, fields(trace_id))]
    async fn delete(
        &self,
        latest: &DhcpOptions,
        cancel: &CancellationToken,
    ) -> Result<DhcpOptions> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = dhcp_options_id(latest)?;
        self.sync_vpcs(&[], &latest.spec.vpc, id, cancel).await?;
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteDhcpOptions",
                self.ctx.client.delete_dhcp_options(id.to_string()),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
