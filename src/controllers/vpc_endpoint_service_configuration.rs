use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    CreateVpcEndpointServiceConfigurationInput, ModifyVpcEndpointServiceConfigurationInput,
    ModifyVpcEndpointServicePermissionsInput, ServiceConfigurationDescription, TagsApi,
    VpcEndpointServiceApi,
};
use crate::reconcilers::{compute_delta, compute_desired_delta, diff};
use crate::resources::object;
use crate::resources::vpc_endpoint_service_configuration::{
    VpcEndpointServiceConfiguration, VpcEndpointServiceConfigurationSpec,
    VpcEndpointServiceConfigurationStatus, SERVICE_STATE_AVAILABLE,
};
use crate::{telemetry, Error, OpType, Result};

const CONFIGURATION_FIELDS: [&str; 5] = [
    "acceptanceRequired",
    "gatewayLoadBalancerARNs",
    "networkLoadBalancerARNs",
    "privateDNSName",
    "supportedIPAddressTypes",
];

pub struct VpcEndpointServiceConfigurationManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> VpcEndpointServiceConfigurationManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

fn service_id(resource: &VpcEndpointServiceConfiguration) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "serviceID")
}

fn service_state(resource: &VpcEndpointServiceConfiguration) -> Option<&str> {
    resource
        .status
        .as_ref()
        .and_then(|s| s.service_state.as_deref())
}

fn status(service: &ServiceConfigurationDescription) -> VpcEndpointServiceConfigurationStatus {
    VpcEndpointServiceConfigurationStatus {
        id: Some(service.service_id.clone()),
        service_name: service.service_name.clone(),
        service_state: service.service_state.clone(),
    }
}

/// One configuration modification. Unset desired fields are left out.
fn modification(
    id: &str,
    desired: &VpcEndpointServiceConfigurationSpec,
    latest: &VpcEndpointServiceConfigurationSpec,
) -> Result<ModifyVpcEndpointServiceConfigurationInput> {
    let gateways = compute_desired_delta(
        &desired.gateway_load_balancer_arns,
        &latest.gateway_load_balancer_arns,
    )?;
    let networks = compute_desired_delta(
        &desired.network_load_balancer_arns,
        &latest.network_load_balancer_arns,
    )?;
    let ip_types = compute_desired_delta(
        &desired.supported_ip_address_types,
        &latest.supported_ip_address_types,
    )?;
    let (private_dns_name, remove_private_dns_name) = match desired.private_dns_name.as_deref() {
        Some("") => (None, latest.private_dns_name.is_some().then_some(true)),
        Some(name) if latest.private_dns_name.as_deref() != Some(name) => {
            (Some(name.to_string()), None)
        }
        _ => (None, None),
    };
    Ok(ModifyVpcEndpointServiceConfigurationInput {
        service_id: id.to_string(),
        acceptance_required: desired
            .acceptance_required
            .filter(|_| desired.acceptance_required != latest.acceptance_required),
        private_dns_name,
        remove_private_dns_name,
        add_gateway_load_balancer_arns: gateways.to_add,
        remove_gateway_load_balancer_arns: gateways.to_delete,
        add_network_load_balancer_arns: networks.to_add,
        remove_network_load_balancer_arns: networks.to_delete,
        add_supported_ip_address_types: ip_types.to_add,
        remove_supported_ip_address_types: ip_types.to_delete,
    })
}

impl<C: VpcEndpointServiceApi> VpcEndpointServiceConfigurationManager<C> {
    async fn sync_principals(
        &self,
        id: &str,
        desired: &[String],
        latest: &[String],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let delta = compute_delta(desired, latest)?;
        if delta.is_empty() {
            return Ok(());
        }
        let input = ModifyVpcEndpointServicePermissionsInput {
            service_id: id.to_string(),
            add_allowed_principals: delta.to_add,
            remove_allowed_principals: delta.to_delete,
        };
        self.ctx
            .call(
                cancel,
                OpType::Update,
                "ModifyVpcEndpointServicePermissions",
                self.ctx.client.modify_vpc_endpoint_service_permissions(input),
            )
            .await
    }
}

#[async_trait]
impl<C> ResourceManager for VpcEndpointServiceConfigurationManager<C>
where
    C: VpcEndpointServiceApi + TagsApi,
{
    type Spec = VpcEndpointServiceConfigurationSpec;
    type Status = VpcEndpointServiceConfigurationStatus;

    const KIND: &'static str = "VPCEndpointServiceConfiguration";

    /// Allowed principals come from a separate permissions call.
    #[instrument(skip_all, fields(trace_id))]
    async fn find(
        &self,
        resource: &VpcEndpointServiceConfiguration,
        cancel: &CancellationToken,
    ) -> Result<VpcEndpointServiceConfiguration> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = service_id(resource).map_err(|_| Error::NotFound)?;
        let services = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeVpcEndpointServiceConfigurations",
                self.ctx
                    .client
                    .describe_vpc_endpoint_service_configurations(vec![id.to_string()]),
            )
            .await
            .map_err(not_found)?;
        let service = single(services)?;
        if service.service_state.as_deref() == Some("Deleted") {
            return Err(Error::NotFound);
        }
        let principals = self
            .ctx
            .call(
                cancel,
                OpType::ReadMany,
                "DescribeVpcEndpointServicePermissions",
                self.ctx
                    .client
                    .describe_vpc_endpoint_service_permissions(id.to_string()),
            )
            .await?;

        let status = status(&service);
        let spec = VpcEndpointServiceConfigurationSpec {
            acceptance_required: service.acceptance_required,
            gateway_load_balancer_arns: Some(service.gateway_load_balancer_arns),
            network_load_balancer_arns: Some(service.network_load_balancer_arns),
            private_dns_name: service.private_dns_name,
            supported_ip_address_types: Some(service.supported_ip_address_types),
            allowed_principals: principals,
            tags: service.tags,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    /// Principals are granted on a later pass, once the service is available.
    #[instrument(skip_all, fields(trace_id))]
    async fn create(
        &self,
        desired: &VpcEndpointServiceConfiguration,
        cancel: &CancellationToken,
    ) -> Result<VpcEndpointServiceConfiguration> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let spec = &desired.spec;
        let input = CreateVpcEndpointServiceConfigurationInput {
            acceptance_required: spec.acceptance_required,
            gateway_load_balancer_arns: spec.gateway_load_balancer_arns.clone().unwrap_or_default(),
            network_load_balancer_arns: spec.network_load_balancer_arns.clone().unwrap_or_default(),
            private_dns_name: spec.private_dns_name.clone().filter(|n| !n.is_empty()),
            supported_ip_address_types: spec.supported_ip_address_types.clone().unwrap_or_default(),
            tags: spec.tags.clone(),
        };
        let service = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateVpcEndpointServiceConfiguration",
                self.ctx.client.create_vpc_endpoint_service_configuration(input),
            )
            .await?;
        info!(service_id = %service.service_id, "Created VPC endpoint service configuration");

        // the next pass's find refreshes the rest of the state
        let mut created = desired.clone();
        created.status = Some(status(&service));
        Ok(created)
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &VpcEndpointServiceConfiguration,
        latest: &VpcEndpointServiceConfiguration,
        cancel: &CancellationToken,
    ) -> Result<VpcEndpointServiceConfiguration> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = service_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if service_state(latest) != Some(SERVICE_STATE_AVAILABLE) {
            let state = service_state(latest).unwrap_or("unknown");
            return Err(self.ctx.config.requeue(format!("endpoint service is {state}")));
        }

        if CONFIGURATION_FIELDS.iter().any(|f| delta.different_at(f)) {
            let input = modification(id, &desired.spec, &latest.spec)?;
            self.ctx
                .call(
                    cancel,
                    OpType::Update,
                    "ModifyVpcEndpointServiceConfiguration",
                    self.ctx.client.modify_vpc_endpoint_service_configuration(input),
                )
                .await?;
        }
        if delta.different_at("allowedPrincipals") {
            self.sync_principals(
                id,
                &desired.spec.allowed_principals,
                &latest.spec.allowed_principals,
                cancel,
            )
            .await?;
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        self.find(latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn delete(
        &self,
        latest: &VpcEndpointServiceConfiguration,
        cancel: &CancellationToken,
    ) -> Result<VpcEndpointServiceConfiguration> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = service_id(latest)?;
        if matches!(service_state(latest), Some("Deleting" | "Deleted")) {
            return Ok(latest.clone());
        }
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteVpcEndpointServiceConfigurations",
                self.ctx
                    .client
                    .delete_vpc_endpoint_service_configurations(vec![id.to_string()]),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
