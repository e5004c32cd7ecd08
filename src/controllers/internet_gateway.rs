use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{field, info, instrument, Span};

use super::route_table::{
    associated_route_tables, describe_associations, sync_associations, Associated,
};
use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    CreateInternetGatewayInput, InternetGatewayApi, InternetGatewayAttachmentInput, RouteTableApi,
    TagsApi,
};
use crate::reconcilers::diff;
use crate::resources::internet_gateway::{
    attached_vpc, InternetGateway, InternetGatewaySpec, InternetGatewayStatus,
};
use crate::resources::object;
use crate::resources::route_table::RouteTableAssociation;
use crate::{telemetry, Error, OpType, Result};

pub struct InternetGatewayManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> InternetGatewayManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

fn gateway_id(resource: &InternetGateway) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "internetGatewayID")
}

fn associations(resource: &InternetGateway) -> &[RouteTableAssociation] {
    resource
        .status
        .as_ref()
        .map(|s| s.route_table_associations.as_slice())
        .unwrap_or_default()
}

impl<C: InternetGatewayApi> InternetGatewayManager<C> {
    async fn attach(&self, id: &str, vpc_id: &str, cancel: &CancellationToken) -> Result<()> {
        let input = InternetGatewayAttachmentInput {
            internet_gateway_id: id.to_string(),
            vpc_id: vpc_id.to_string(),
        };
        self.ctx
            .call(
                cancel,
                OpType::Update,
                "AttachInternetGateway",
                self.ctx.client.attach_internet_gateway(input),
            )
            .await
    }

    /// A gateway that is already detached is not an error.
    async fn detach(&self, id: &str, vpc_id: &str, cancel: &CancellationToken) -> Result<()> {
        let input = InternetGatewayAttachmentInput {
            internet_gateway_id: id.to_string(),
            vpc_id: vpc_id.to_string(),
        };
        self.ctx
            .call(
                cancel,
                OpType::Update,
                "DetachInternetGateway",
                self.ctx.client.detach_internet_gateway(input),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })
    }
}

#[async_trait]
impl<C> ResourceManager for InternetGatewayManager<C>
where
    C: InternetGatewayApi + RouteTableApi + TagsApi,
{
    type Spec = InternetGatewaySpec;
    type Status = InternetGatewayStatus;

    const KIND: &'static str = "InternetGateway";

    /// `vpc` is the attachment that is not detached or on its way out.
    #[instrument(skip_all, fields(trace_id))]
    async fn find(
        &self,
        resource: &InternetGateway,
        cancel: &CancellationToken,
    ) -> Result<InternetGateway> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = gateway_id(resource).map_err(|_| Error::NotFound)?;
        let gateways = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeInternetGateways",
                self.ctx.client.describe_internet_gateways(vec![id.to_string()]),
            )
            .await
            .map_err(not_found)?;
        let gateway = single(gateways)?;
        let associations = describe_associations(&self.ctx, cancel, Associated::Gateway(id)).await?;

        let spec = InternetGatewaySpec {
            vpc: attached_vpc(&gateway.attachments),
            route_tables: Some(associated_route_tables(&associations)),
            tags: gateway.tags,
        };
        let status = InternetGatewayStatus {
            id: Some(gateway.internet_gateway_id),
            owner_id: gateway.owner_id,
            attachments: gateway.attachments,
            route_table_associations: associations,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(
        &self,
        desired: &InternetGateway,
        cancel: &CancellationToken,
    ) -> Result<InternetGateway> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateInternetGatewayInput {
            tags: desired.spec.tags.clone(),
        };
        let id = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateInternetGateway",
                self.ctx.client.create_internet_gateway(input),
            )
            .await?;
        info!(internet_gateway_id = %id, "Created internet gateway");

        if let Some(vpc_id) = &desired.spec.vpc {
            self.attach(&id, vpc_id, cancel).await?;
        }
        let target = Associated::Gateway(&id);
        sync_associations(&self.ctx, cancel, target, &desired.spec.route_tables, &[]).await?;

        // the next pass's find refreshes the rest of the state
        let mut created = desired.clone();
        created.status = Some(InternetGatewayStatus {
            id: Some(id),
            ..Default::default()
        });
        Ok(created)
    }

    /// The VPC attachment moves before route tables are associated, since
    /// edge associations need the gateway attached to the table's VPC.
    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &InternetGateway,
        latest: &InternetGateway,
        cancel: &CancellationToken,
    ) -> Result<InternetGateway> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = gateway_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if delta.different_at("vpc") {
            if let Some(vpc_id) = &latest.spec.vpc {
                self.detach(id, vpc_id, cancel).await?;
            }
            if let Some(vpc_id) = &desired.spec.vpc {
                self.attach(id, vpc_id, cancel).await?;
            }
        }
        if delta.different_at("routeTables") {
            let target = Associated::Gateway(id);
            let latest_associations = associations(latest);
            sync_associations(
                &self.ctx,
                cancel,
                target,
                &desired.spec.route_tables,
                latest_associations,
            )
                .await?;
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        self.find(latest, cancel).await
    }

    /// Route tables are released and the VPC detached before the gateway
    /// itself is deleted.
    #[instrument(skip_all, fields(trace_id))]
    async fn delete(
        &self,
        latest: &InternetGateway,
        cancel: &CancellationToken,
    ) -> Result<InternetGateway> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = gateway_id(latest)?;
        let target = Associated::Gateway(id);
        sync_associations(&self.ctx, cancel, target, &Some(vec![]), associations(latest)).await?;
        if let Some(vpc_id) = &latest.spec.vpc {
            self.detach(id, vpc_id, cancel).await?;
        }
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteInternetGateway",
                self.ctx.client.delete_internet_gateway(id.to_string()),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
