use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    CreateVpcEndpointInput, ModifyVpcEndpointInput, TagsApi, VpcEndpointApi, VpcEndpointDescription,
};
use crate::reconcilers::{compute_desired_delta, diff, FieldDelta};
use crate::resources::object;
use crate::resources::vpc_endpoint::{
    VpcEndpoint, VpcEndpointSpec, VpcEndpointStatus, STATE_PENDING,
};
use crate::{telemetry, Error, OpType, Result};

pub struct VpcEndpointManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> VpcEndpointManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

fn endpoint_id(resource: &VpcEndpoint) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "vpcEndpointID")
}

fn status(endpoint: &VpcEndpointDescription) -> VpcEndpointStatus {
    VpcEndpointStatus {
        id: Some(endpoint.vpc_endpoint_id.clone()),
        owner_id: endpoint.owner_id.clone(),
        state: endpoint.state.clone(),
    }
}

fn state(resource: &VpcEndpoint) -> Option<&str> {
    resource.status.as_ref().and_then(|s| s.state.as_deref())
}

/// Everything but tags, as one modification.
fn modification(
    desired: &VpcEndpointSpec,
    latest: &VpcEndpointSpec,
    delta: &FieldDelta,
    id: &str,
) -> Result<ModifyVpcEndpointInput> {
    let subnets = compute_desired_delta(&desired.subnet_ids, &latest.subnet_ids)?;
    let route_tables = compute_desired_delta(&desired.route_table_ids, &latest.route_table_ids)?;
    let security_groups =
        compute_desired_delta(&desired.security_group_ids, &latest.security_group_ids)?;
    let policy_document = match &desired.policy_document {
        Some(policy) if delta.different_at("policyDocument") => Some(policy.clone()),
        _ => None,
    };
    Ok(ModifyVpcEndpointInput {
        vpc_endpoint_id: id.to_string(),
        add_subnet_ids: subnets.to_add,
        remove_subnet_ids: subnets.to_delete,
        add_route_table_ids: route_tables.to_add,
        remove_route_table_ids: route_tables.to_delete,
        add_security_group_ids: security_groups.to_add,
        remove_security_group_ids: security_groups.to_delete,
        policy_document,
        private_dns_enabled: desired
            .private_dns_enabled
            .filter(|_| delta.different_at("privateDNSEnabled")),
    })
}

#[async_trait]
impl<C: VpcEndpointApi + TagsApi> ResourceManager for VpcEndpointManager<C> {
    type Spec = VpcEndpointSpec;
    type Status = VpcEndpointStatus;

    const KIND: &'static str = "VPCEndpoint";

    /// A `deleted` endpoint is reported as missing.
    #[instrument(skip_all, fields(trace_id))]
    async fn find(
        &self,
        resource: &VpcEndpoint,
        cancel: &CancellationToken,
    ) -> Result<VpcEndpoint> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = endpoint_id(resource).map_err(|_| Error::NotFound)?;
        let endpoints = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeVpcEndpoints",
                self.ctx.client.describe_vpc_endpoints(vec![id.to_string()]),
            )
            .await
            .map_err(not_found)?;
        let endpoint = single(endpoints)?;
        if endpoint.state.as_deref() == Some("deleted") {
            return Err(Error::NotFound);
        }
        let status = status(&endpoint);
        let spec = VpcEndpointSpec {
            service_name: endpoint.service_name,
            vpc_id: endpoint.vpc_id,
            vpc_endpoint_type: endpoint.vpc_endpoint_type,
            subnet_ids: Some(endpoint.subnet_ids),
            route_table_ids: Some(endpoint.route_table_ids),
            security_group_ids: Some(endpoint.security_group_ids),
            policy_document: endpoint.policy_document,
            private_dns_enabled: endpoint.private_dns_enabled,
            tags: endpoint.tags,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(
        &self,
        desired: &VpcEndpoint,
        cancel: &CancellationToken,
    ) -> Result<VpcEndpoint> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let spec = &desired.spec;
        let input = CreateVpcEndpointInput {
            service_name: spec.service_name.clone(),
            vpc_id: spec.vpc_id.clone(),
            vpc_endpoint_type: spec.vpc_endpoint_type.clone(),
            subnet_ids: spec.subnet_ids.clone().unwrap_or_default(),
            route_table_ids: spec.route_table_ids.clone().unwrap_or_default(),
            security_group_ids: spec.security_group_ids.clone().unwrap_or_default(),
            policy_document: spec.policy_document.clone(),
            private_dns_enabled: spec.private_dns_enabled,
            tags: spec.tags.clone(),
        };
        let endpoint = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateVpcEndpoint",
                self.ctx.client.create_vpc_endpoint(input),
            )
            .await?;
        info!(vpc_endpoint_id = %endpoint.vpc_endpoint_id, "Created VPC endpoint");

        // the next pass's find refreshes the rest of the state
        let mut created = desired.clone();
        created.status = Some(status(&endpoint));
        Ok(created)
    }

    /// Subnet, route table, security group, policy and private DNS changes go
    /// out in a single modification once the endpoint is no longer `pending`.
    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &VpcEndpoint,
        latest: &VpcEndpoint,
        cancel: &CancellationToken,
    ) -> Result<VpcEndpoint> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = endpoint_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if state(latest) == Some(STATE_PENDING) {
            return Err(self.ctx.config.requeue("endpoint is pending"));
        }
        for immutable in ["serviceName", "vpcID", "vpcEndpointType"] {
            if delta.different_at(immutable) {
                return Err(Error::Terminal(format!(
                    "VPC endpoint {immutable} cannot be changed after creation"
                )));
            }
        }

        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        let input = modification(&desired.spec, &latest.spec, &delta, id)?;
        if !input.is_empty() {
            self.ctx
                .call(
                    cancel,
                    OpType::Update,
                    "ModifyVpcEndpoint",
                    self.ctx.client.modify_vpc_endpoint(input),
                )
                .await?;
        }
        self.find(latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn delete(
        &self,
        latest: &VpcEndpoint,
        cancel: &CancellationToken,
    ) -> Result<VpcEndpoint> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = endpoint_id(latest)?;
        if matches!(state(latest), Some("deleting" | "deleted")) {
            return Ok(latest.clone());
        }
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteVpcEndpoints",
                self.ctx.client.delete_vpc_endpoints(vec![id.to_string()]),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
