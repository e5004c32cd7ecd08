use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    AssociateRouteTableInput, CreateRouteInput, CreateRouteTableInput, DeleteRouteInput,
    DescribeRouteTablesInput, Filter, RouteTableApi, TagsApi,
};
use crate::reconcilers::{apply_delta, compute_delta, compute_desired_delta, diff, Mutator};
use crate::resources::object;
use crate::resources::route_table::{
    Route, RouteTable, RouteTableAssociation, RouteTableSpec, RouteTableStatus,
};
use crate::{telemetry, Error, OpType, Result};

pub struct RouteTableManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> RouteTableManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

struct RouteMutator<'a, C> {
    ctx: &'a Context<C>,
    cancel: &'a CancellationToken,
    route_table_id: &'a str,
}

#[async_trait]
impl<'a, C: RouteTableApi> Mutator<Route> for RouteMutator<'a, C> {
    async fn delete(&self, items: Vec<Route>) -> Result<()> {
        for route in items {
            let input = DeleteRouteInput::new(self.route_table_id, &route);
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "DeleteRoute",
                    self.ctx.client.delete_route(input),
                )
                .await?;
        }
        Ok(())
    }

    async fn add(&self, items: Vec<Route>) -> Result<()> {
        for route in items {
            let input = CreateRouteInput {
                route_table_id: self.route_table_id.to_string(),
                route: route.without_observed(),
            };
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "CreateRoute",
                    self.ctx.client.create_route(input),
                )
                .await?;
        }
        Ok(())
    }
}

fn route_table_id(resource: &RouteTable) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "routeTableID")
}

impl<C: RouteTableApi> RouteTableManager<C> {
    async fn sync_routes(
        &self,
        desired: &[Route],
        latest: &[Route],
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let delta = compute_delta(desired, latest)?;
        let mutator = RouteMutator {
            ctx: &self.ctx,
            cancel,
            route_table_id: id,
        };
        apply_delta(&mutator, delta).await
    }
}

/// The subnet or gateway on the other end of route table associations.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Associated<'a> {
    Subnet(&'a str),
    Gateway(&'a str),
}

impl<'a> Associated<'a> {
    fn filter(&self) -> Filter {
        match self {
            Associated::Subnet(id) => Filter::new("association.subnet-id", *id),
            Associated::Gateway(id) => Filter::new("association.gateway-id", *id),
        }
    }

    fn is_target_of(&self, association: &RouteTableAssociation) -> bool {
        match self {
            Associated::Subnet(id) => association.subnet_id.as_deref() == Some(id),
            Associated::Gateway(id) => association.gateway_id.as_deref() == Some(id),
        }
    }

    fn input(&self, route_table_id: String) -> AssociateRouteTableInput {
        let (subnet_id, gateway_id) = match self {
            Associated::Subnet(id) => (Some(id.to_string()), None),
            Associated::Gateway(id) => (None, Some(id.to_string())),
        };
        AssociateRouteTableInput {
            route_table_id,
            subnet_id,
            gateway_id,
        }
    }
}

/// The live explicit associations of `target`.
pub(crate) async fn describe_associations<C: RouteTableApi>(
    ctx: &Context<C>,
    cancel: &CancellationToken,
    target: Associated<'_>,
) -> Result<Vec<RouteTableAssociation>> {
    let input = DescribeRouteTablesInput {
        filters: vec![target.filter()],
        ..Default::default()
    };
    let tables = ctx
        .call(
            cancel,
            OpType::ReadMany,
            "DescribeRouteTables",
            ctx.client.describe_route_tables(input),
        )
        .await?;
    Ok(tables
        .into_iter()
        .flat_map(|t| t.associations)
        .filter(|a| a.is_associated() && target.is_target_of(a))
        .collect())
}

/// The route table ids of `associations`, in the shape specs hold them.
pub(crate) fn associated_route_tables(associations: &[RouteTableAssociation]) -> Vec<String> {
    associations
        .iter()
        .filter_map(|a| a.route_table_id.clone())
        .collect()
}

/// Associates route tables with one subnet or gateway. Tables are removed by
/// the association id recorded when the resource was last read.
struct AssociationMutator<'a, C> {
    ctx: &'a Context<C>,
    cancel: &'a CancellationToken,
    target: Associated<'a>,
    associations: &'a [RouteTableAssociation],
}

#[async_trait]
impl<'a, C: RouteTableApi> Mutator<String> for AssociationMutator<'a, C> {
    async fn delete(&self, items: Vec<String>) -> Result<()> {
        for route_table_id in items {
            let association = self
                .associations
                .iter()
                .find(|a| a.route_table_id.as_ref() == Some(&route_table_id))
                .and_then(|a| a.id.clone());
            let Some(association_id) = association else {
                debug!(%route_table_id, "No association to remove");
                continue;
            };
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "DisassociateRouteTable",
                    self.ctx.client.disassociate_route_table(association_id),
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
        for route_table_id in items {
            let input = self.target.input(route_table_id);
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "AssociateRouteTable",
                    self.ctx.client.associate_route_table(input),
                )
                .await?;
        }
        Ok(())
    }
}

/// Converge the explicit route table associations of `target` on `desired`.
/// An unset `desired` leaves them alone.
pub(crate) async fn sync_associations<C: RouteTableApi>(
    ctx: &Context<C>,
    cancel: &CancellationToken,
    target: Associated<'_>,
    desired: &Option<Vec<String>>,
    latest: &[RouteTableAssociation],
) -> Result<()> {
    let delta = compute_desired_delta(desired, &Some(associated_route_tables(latest)))?;
    let mutator = AssociationMutator {
        ctx,
        cancel,
        target,
        associations: latest,
    };
    apply_delta(&mutator, delta).await
}

#[async_trait]
impl<C: RouteTableApi + TagsApi> ResourceManager for RouteTableManager<C> {
    type Spec = RouteTableSpec;
    type Status = RouteTableStatus;

    const KIND: &'static str = "RouteTable";

    #[instrument(skip_all, fields(trace_id))]
    async fn find(&self, resource: &RouteTable, cancel: &CancellationToken) -> Result<RouteTable> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = route_table_id(resource).map_err(|_| Error::NotFound)?;
        let tables = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeRouteTables",
                self.ctx.client.describe_route_tables(DescribeRouteTablesInput {
                    route_table_ids: vec![id.to_string()],
                    ..Default::default()
                }),
            )
            .await
            .map_err(not_found)?;
        let table = single(tables)?;
        let spec = RouteTableSpec {
            vpc_id: table.vpc_id,
            routes: table.routes.clone(),
            tags: table.tags,
        };
        let status = RouteTableStatus {
            id: Some(table.route_table_id),
            owner_id: table.owner_id,
            route_statuses: table.routes,
            associations: table.associations,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(&self, desired: &RouteTable, cancel: &CancellationToken) -> Result<RouteTable> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateRouteTableInput {
            vpc_id: desired.spec.vpc_id.clone(),
            tags: desired.spec.tags.clone(),
        };
        let id = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateRouteTable",
                self.ctx.client.create_route_table(input),
            )
            .await?;
        info!(route_table_id = %id, "Created route table");

        let mut created = desired.clone();
        created.status = Some(RouteTableStatus {
            id: Some(id.clone()),
            ..Default::default()
        });
        let latest = self.find(&created, cancel).await?;
        self.sync_routes(&desired.spec.routes, &latest.spec.routes, &id, cancel)
            .await?;
        self.find(&latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &RouteTable,
        latest: &RouteTable,
        cancel: &CancellationToken,
    ) -> Result<RouteTable> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = route_table_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if delta.different_at("vpcID") {
            return Err(Error::Terminal(
                "route table vpcID cannot be changed after creation".into(),
            ));
        }
        if delta.different_at("routes") {
            self.sync_routes(&desired.spec.routes, &latest.spec.routes, id, cancel)
                .await?;
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        self.find(latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn delete(&self, latest: &RouteTable, cancel: &CancellationToken) -> Result<RouteTable> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = route_table_id(latest)?;
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteRouteTable",
                self.ctx.client.delete_route_table(id.to_string()),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
