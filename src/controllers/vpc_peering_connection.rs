use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    CreateVpcPeeringConnectionInput, ModifyVpcPeeringConnectionOptionsInput, TagsApi,
    VpcPeeringApi, VpcPeeringConnectionDescription,
};
use crate::reconcilers::diff;
use crate::resources::object;
use crate::resources::vpc_peering_connection::{
    PeeringConnectionOptions, PeeringState, VpcPeeringConnection, VpcPeeringConnectionSpec,
    VpcPeeringConnectionStatus,
};
use crate::{telemetry, Error, OpType, Result};

pub struct VpcPeeringConnectionManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> VpcPeeringConnectionManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

fn peering_id(resource: &VpcPeeringConnection) -> Result<&str> {
    required(
        resource.status.as_ref().and_then(|s| s.id.as_ref()),
        "vpcPeeringConnectionID",
    )
}

fn state(resource: &VpcPeeringConnection) -> PeeringState {
    resource
        .status
        .as_ref()
        .map_or(PeeringState::Unknown, VpcPeeringConnectionStatus::state)
}

fn status(connection: &VpcPeeringConnectionDescription) -> VpcPeeringConnectionStatus {
    VpcPeeringConnectionStatus {
        id: Some(connection.vpc_peering_connection_id.clone()),
        status: connection.status.clone(),
        expiration_time: connection.expiration_time.clone(),
        accepted: None,
    }
}

/// Desired options that differ from what EC2 reports. Unset options are left alone.
fn changed_options(
    desired: &Option<PeeringConnectionOptions>,
    latest: &Option<PeeringConnectionOptions>,
) -> Option<PeeringConnectionOptions> {
    desired.as_ref().filter(|d| Some(*d) != latest.as_ref()).cloned()
}

#[async_trait]
impl<C: VpcPeeringApi + TagsApi> ResourceManager for VpcPeeringConnectionManager<C> {
    type Spec = VpcPeeringConnectionSpec;
    type Status = VpcPeeringConnectionStatus;

    const KIND: &'static str = "VPCPeeringConnection";

    /// A connection in the `deleted` state is reported as not found.
    /// `acceptRequest` has no EC2 counterpart: it reads true once this
    /// controller accepted the request and otherwise follows the resource
    /// being looked up.
    #[instrument(skip_all, fields(trace_id))]
    async fn find(
        &self,
        resource: &VpcPeeringConnection,
        cancel: &CancellationToken,
    ) -> Result<VpcPeeringConnection> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = peering_id(resource).map_err(|_| Error::NotFound)?;
        let connections = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeVpcPeeringConnections",
                self.ctx
                    .client
                    .describe_vpc_peering_connections(vec![id.to_string()]),
            )
            .await
            .map_err(not_found)?;
        let connection = single(connections)?;
        let accepted = resource.status.as_ref().and_then(|s| s.accepted);
        let mut status = status(&connection);
        if status.state() == PeeringState::Deleted {
            return Err(Error::NotFound);
        }
        status.accepted = accepted;

        let requester = connection.requester_vpc_info;
        let accepter = connection.accepter_vpc_info;
        let spec = VpcPeeringConnectionSpec {
            vpc_id: requester.vpc_id,
            peer_vpc_id: accepter.vpc_id,
            peer_owner_id: accepter.owner_id,
            peer_region: accepter.region,
            accept_request: match accepted {
                Some(true) => Some(true),
                _ => resource.spec.accept_request,
            },
            accepter_peering_connection_options: accepter.peering_options,
            requester_peering_connection_options: requester.peering_options,
            tags: connection.tags,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(
        &self,
        desired: &VpcPeeringConnection,
        cancel: &CancellationToken,
    ) -> Result<VpcPeeringConnection> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateVpcPeeringConnectionInput {
            vpc_id: desired.spec.vpc_id.clone(),
            peer_vpc_id: desired.spec.peer_vpc_id.clone(),
            peer_owner_id: desired.spec.peer_owner_id.clone(),
            peer_region: desired.spec.peer_region.clone(),
            tags: desired.spec.tags.clone(),
        };
        let connection = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateVpcPeeringConnection",
                self.ctx.client.create_vpc_peering_connection(input),
            )
            .await?;
        info!(
            vpc_peering_connection_id = %connection.vpc_peering_connection_id,
            "Created VPC peering connection"
        );

        // the next pass's find refreshes the rest of the state
        let mut created = desired.clone();
        created.status = Some(status(&connection));
        Ok(created)
    }

    /// Accepts a pending request when asked to, then applies option changes
    /// once the connection is active.
    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &VpcPeeringConnection,
        latest: &VpcPeeringConnection,
        cancel: &CancellationToken,
    ) -> Result<VpcPeeringConnection> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = peering_id(latest)?;
        let state = state(latest);
        let delta = diff(&desired.spec, &latest.spec);
        let accept =
            desired.spec.accept_request == Some(true) && state == PeeringState::PendingAcceptance;
        if delta.is_empty() && !accept {
            return Ok(latest.clone());
        }
        if state.is_transitional() {
            return Err(self.ctx.config.requeue(format!("peering connection is {state:?}")));
        }
        for immutable in ["vpcID", "peerVPCID", "peerOwnerID", "peerRegion"] {
            if delta.different_at(immutable) {
                return Err(Error::Terminal(format!(
                    "VPC peering connection {immutable} cannot be changed after creation"
                )));
            }
        }
        if delta.different_at("acceptRequest")
            && desired.spec.accept_request == Some(false)
            && latest.spec.accept_request == Some(true)
        {
            return Err(Error::Terminal(
                "an accepted VPC peering connection cannot be unaccepted".into(),
            ));
        }

        if accept {
            self.ctx
                .call(
                    cancel,
                    OpType::Update,
                    "AcceptVpcPeeringConnection",
                    self.ctx.client.accept_vpc_peering_connection(id.to_string()),
                )
                .await?;
            info!(vpc_peering_connection_id = %id, "Accepted VPC peering connection");
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        if accept {
            // options wait for the connection to become active
            let mut accepted = latest.clone();
            if let Some(status) = accepted.status.as_mut() {
                status.accepted = Some(true);
            }
            return self.find(&accepted, cancel).await;
        }

        let accepter = changed_options(
            &desired.spec.accepter_peering_connection_options,
            &latest.spec.accepter_peering_connection_options,
        );
        let requester = changed_options(
            &desired.spec.requester_peering_connection_options,
            &latest.spec.requester_peering_connection_options,
        );
        if accepter.is_some() || requester.is_some() {
            if state != PeeringState::Active {
                debug!(?state, "Deferring peering options until the connection is active");
                return Err(self.ctx.config.requeue("peering options require an active connection"));
            }
            let input = ModifyVpcPeeringConnectionOptionsInput {
                vpc_peering_connection_id: id.to_string(),
                accepter_peering_connection_options: accepter,
                requester_peering_connection_options: requester,
            };
            self.ctx
                .call(
                    cancel,
                    OpType::Update,
                    "ModifyVpcPeeringConnectionOptions",
                    self.ctx.client.modify_vpc_peering_connection_options(input),
                )
                .await?;
        }
        self.find(latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn delete(
        &self,
        latest: &VpcPeeringConnection,
        cancel: &CancellationToken,
    ) -> Result<VpcPeeringConnection> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = peering_id(latest)?;
        let state = state(latest);
        match state {
            PeeringState::InitiatingRequest | PeeringState::Provisioning => {
                return Err(self.ctx.config.requeue(format!("peering connection is {state:?}")));
            }
            PeeringState::Deleting => return Ok(latest.clone()),
            s if s.is_final() => return Ok(latest.clone()),
            _ => {}
        }
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteVpcPeeringConnection",
                self.ctx.client.delete_vpc_peering_connection(id.to_string()),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
