use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    CreateTransitGatewayVpcAttachmentInput, ModifyTransitGatewayVpcAttachmentInput, TagsApi,
    TransitGatewayApi, TransitGatewayVpcAttachmentDescription,
};
use crate::reconcilers::{compute_delta, diff};
use crate::resources::object;
use crate::resources::transit_gateway_vpc_attachment::{
    TransitGatewayVpcAttachment, TransitGatewayVpcAttachmentSpec, TransitGatewayVpcAttachmentStatus,
    STATE_AVAILABLE,
};
use crate::{telemetry, Error, OpType, Result};

pub struct TransitGatewayVpcAttachmentManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> TransitGatewayVpcAttachmentManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

fn attachment_id(resource: &TransitGatewayVpcAttachment) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "id")
}

fn status(
    attachment: &TransitGatewayVpcAttachmentDescription,
) -> TransitGatewayVpcAttachmentStatus {
    TransitGatewayVpcAttachmentStatus {
        id: Some(attachment.transit_gateway_attachment_id.clone()),
        state: attachment.state.clone(),
        vpc_owner_id: attachment.vpc_owner_id.clone(),
    }
}

fn state(resource: &TransitGatewayVpcAttachment) -> Option<&str> {
    resource.status.as_ref().and_then(|s| s.state.as_deref())
}

#[async_trait]
impl<C: TransitGatewayApi + TagsApi> ResourceManager for TransitGatewayVpcAttachmentManager<C> {
    type Spec = TransitGatewayVpcAttachmentSpec;
    type Status = TransitGatewayVpcAttachmentStatus;

    const KIND: &'static str = "TransitGatewayVPCAttachment";

    #[instrument(skip_all, fields(trace_id))]
    async fn find(
        &self,
        resource: &TransitGatewayVpcAttachment,
        cancel: &CancellationToken,
    ) -> Result<TransitGatewayVpcAttachment> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = attachment_id(resource).map_err(|_| Error::NotFound)?;
        let attachments = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeTransitGatewayVpcAttachments",
                self.ctx
                    .client
                    .describe_transit_gateway_vpc_attachments(vec![id.to_string()]),
            )
            .await
            .map_err(not_found)?;
        let attachment = single(attachments)?;
        let status = status(&attachment);
        let spec = TransitGatewayVpcAttachmentSpec {
            transit_gateway_id: attachment.transit_gateway_id,
            vpc_id: attachment.vpc_id,
            subnet_ids: attachment.subnet_ids,
            options: attachment.options,
            tags: attachment.tags,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(
        &self,
        desired: &TransitGatewayVpcAttachment,
        cancel: &CancellationToken,
    ) -> Result<TransitGatewayVpcAttachment> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateTransitGatewayVpcAttachmentInput {
            transit_gateway_id: desired.spec.transit_gateway_id.clone(),
            vpc_id: desired.spec.vpc_id.clone(),
            subnet_ids: desired.spec.subnet_ids.clone(),
            options: desired.spec.options.clone(),
            tags: desired.spec.tags.clone(),
        };
        let attachment = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateTransitGatewayVpcAttachment",
                self.ctx.client.create_transit_gateway_vpc_attachment(input),
            )
            .await?;
        info!(
            attachment_id = %attachment.transit_gateway_attachment_id,
            "Created transit gateway VPC attachment"
        );

        // the next pass's find refreshes the rest of the state
        let mut created = desired.clone();
        created.status = Some(status(&attachment));
        Ok(created)
    }

    /// Subnet and option changes go out in a single modification, and only
    /// while the attachment is `available`.
    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &TransitGatewayVpcAttachment,
        latest: &TransitGatewayVpcAttachment,
        cancel: &CancellationToken,
    ) -> Result<TransitGatewayVpcAttachment> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = attachment_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if state(latest) != Some(STATE_AVAILABLE) {
            let state = state(latest).unwrap_or("unknown");
            return Err(self.ctx.config.requeue(format!("attachment is {state}")));
        }
        for immutable in ["transitGatewayID", "vpcID"] {
            if delta.different_at(immutable) {
                return Err(Error::Terminal(format!(
                    "transit gateway VPC attachment {immutable} cannot be changed after creation"
                )));
            }
        }

        let subnets = compute_delta(&desired.spec.subnet_ids, &latest.spec.subnet_ids)?;
        let options = match &desired.spec.options {
            Some(options) if delta.different_at("options") => Some(options.clone()),
            _ => None,
        };
        if !subnets.is_empty() || options.is_some() {
            let input = ModifyTransitGatewayVpcAttachmentInput {
                transit_gateway_attachment_id: id.to_string(),
                add_subnet_ids: subnets.to_add,
                remove_subnet_ids: subnets.to_delete,
                options,
            };
            self.ctx
                .call(
                    cancel,
                    OpType::Update,
                    "ModifyTransitGatewayVpcAttachment",
                    self.ctx.client.modify_transit_gateway_vpc_attachment(input),
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
        latest: &TransitGatewayVpcAttachment,
        cancel: &CancellationToken,
    ) -> Result<TransitGatewayVpcAttachment> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = attachment_id(latest)?;
        if matches!(state(latest), Some("deleting" | "deleted")) {
            return Ok(latest.clone());
        }
        let result = self
            .ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteTransitGatewayVpcAttachment",
                self.ctx
                    .client
                    .delete_transit_gateway_vpc_attachment(id.to_string()),
            )
            .await;
        let mut deleted = latest.clone();
        match result.map_err(not_found) {
            Ok(attachment) => deleted.status = Some(status(&attachment)),
            Err(Error::NotFound) => {}
            Err(e) => return Err(e),
        }
        Ok(deleted)
    }
}
