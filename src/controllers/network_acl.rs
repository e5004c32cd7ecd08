use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    CreateNetworkAclInput, DeleteNetworkAclEntryInput, DescribeNetworkAclsInput, Filter,
    NetworkAclApi, NetworkAclDescription, NetworkAclEntryInput, ReplaceNetworkAclAssociationInput,
    TagsApi,
};
use crate::reconcilers::{apply_delta, compute_delta, diff, Mutator};
use crate::resources::network_acl::{
    NetworkAcl, NetworkAclAssociation, NetworkAclEntry, NetworkAclSpec, NetworkAclStatus,
};
use crate::resources::object;
use crate::{telemetry, Error, OpType, Result};

pub struct NetworkAclManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> NetworkAclManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

struct EntryMutator<'a, C> {
    ctx: &'a Context<C>,
    cancel: &'a CancellationToken,
    network_acl_id: &'a str,
}

#[async_trait]
impl<'a, C: NetworkAclApi> Mutator<NetworkAclEntry> for EntryMutator<'a, C> {
    async fn delete(&self, items: Vec<NetworkAclEntry>) -> Result<()> {
        for entry in items {
            let input = DeleteNetworkAclEntryInput {
                network_acl_id: self.network_acl_id.to_string(),
                egress: entry.egress(),
                rule_number: entry.rule_number.unwrap_or_default(),
            };
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "DeleteNetworkAclEntry",
                    self.ctx.client.delete_network_acl_entry(input),
                )
                .await?;
        }
        Ok(())
    }

    async fn update(&self, items: Vec<NetworkAclEntry>) -> Result<()> {
        for entry in items {
            let input = NetworkAclEntryInput {
                network_acl_id: self.network_acl_id.to_string(),
                entry,
            };
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "ReplaceNetworkAclEntry",
                    self.ctx.client.replace_network_acl_entry(input),
                )
                .await?;
        }
        Ok(())
    }

    async fn add(&self, items: Vec<NetworkAclEntry>) -> Result<()> {
        for entry in items {
            let input = NetworkAclEntryInput {
                network_acl_id: self.network_acl_id.to_string(),
                entry,
            };
            self.ctx
                .call(
                    self.cancel,
                    OpType::Update,
                    "CreateNetworkAclEntry",
                    self.ctx.client.create_network_acl_entry(input),
                )
                .await?;
        }
        Ok(())
    }
}

/// A subnet always belongs to exactly one network ACL, so associations are
/// moved rather than created: added subnets are taken from whichever ACL
/// holds them, removed subnets go back to the VPC default ACL.
struct AssociationMutator<'a, C> {
    ctx: &'a Context<C>,
    cancel: &'a CancellationToken,
    network_acl_id: &'a str,
    vpc_id: Option<&'a str>,
}

impl<'a, C: NetworkAclApi> AssociationMutator<'a, C> {
    async fn describe(&self, filters: Vec<Filter>) -> Result<Vec<NetworkAclDescription>> {
        let input = DescribeNetworkAclsInput {
            network_acl_ids: vec![],
            filters,
        };
        self.ctx
            .call(
                self.cancel,
                OpType::ReadMany,
                "DescribeNetworkAcls",
                self.ctx.client.describe_network_acls(input),
            )
            .await
    }

    async fn default_acl_id(&self) -> Result<String> {
        let vpc_id = self
            .vpc_id
            .ok_or_else(|| Error::invalid("network ACL", "vpcID is required"))?;
        let acls = self
            .describe(vec![Filter::new("default", "true"), Filter::new("vpc-id", vpc_id)])
            .await?;
        single(acls)
            .map(|acl| acl.network_acl_id)
            .map_err(|_| Error::Terminal(format!("VPC {vpc_id} has no default network ACL")))
    }

    async fn move_to(&self, association_id: String, network_acl_id: &str) -> Result<()> {
        let input = ReplaceNetworkAclAssociationInput {
            association_id,
            network_acl_id: network_acl_id.to_string(),
        };
        let new_id = self
            .ctx
            .call(
                self.cancel,
                OpType::Update,
                "ReplaceNetworkAclAssociation",
                self.ctx.client.replace_network_acl_association(input),
            )
            .await?;
        debug!(association_id = %new_id, network_acl_id, "Moved subnet");
        Ok(())
    }
}

#[async_trait]
impl<'a, C: NetworkAclApi> Mutator<NetworkAclAssociation> for AssociationMutator<'a, C> {
    async fn delete(&self, items: Vec<NetworkAclAssociation>) -> Result<()> {
        let default_acl = self.default_acl_id().await?;
        for association in items {
            if let Some(id) = association.network_acl_association_id {
                self.move_to(id, &default_acl).await?;
            }
        }
        Ok(())
    }

    async fn add(&self, items: Vec<NetworkAclAssociation>) -> Result<()> {
        for association in items {
            let subnet = association.subnet_id.unwrap_or_default();
            let current = self
                .describe(vec![Filter::new("association.subnet-id", subnet.as_str())])
                .await?
                .into_iter()
                .flat_map(|acl| acl.associations)
                .find(|a| a.subnet_id.as_deref() == Some(subnet.as_str()))
                .and_then(|a| a.network_acl_association_id)
                .ok_or_else(|| {
                    let message = format!("subnet {subnet} was not found");
                    Error::invalid("network ACL association", message)
                })?;
            self.move_to(current, self.network_acl_id).await?;
        }
        Ok(())
    }
}

fn acl_id(resource: &NetworkAcl) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "id")
}

impl<C: NetworkAclApi + TagsApi> NetworkAclManager<C> {
    async fn sync_entries(
        &self,
        desired: &NetworkAclSpec,
        latest: &NetworkAclSpec,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let entries = compute_delta(&desired.entries, &latest.entries)?;
        let associations = compute_delta(&desired.associations, &latest.associations)?;
        let entry_mutator = EntryMutator {
            ctx: &self.ctx,
            cancel,
            network_acl_id: id,
        };
        apply_delta(&entry_mutator, entries).await?;
        let association_mutator = AssociationMutator {
            ctx: &self.ctx,
            cancel,
            network_acl_id: id,
            vpc_id: latest.vpc_id.as_deref().or(desired.vpc_id.as_deref()),
        };
        apply_delta(&association_mutator, associations).await
    }
}

#[async_trait]
impl<C: NetworkAclApi + TagsApi> ResourceManager for NetworkAclManager<C> {
    type Spec = NetworkAclSpec;
    type Status = NetworkAclStatus;

    const KIND: &'static str = "NetworkACL";

    #[instrument(skip_all, fields(trace_id))]
    async fn find(&self, resource: &NetworkAcl, cancel: &CancellationToken) -> Result<NetworkAcl> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = acl_id(resource).map_err(|_| Error::NotFound)?;
        let input = DescribeNetworkAclsInput {
            network_acl_ids: vec![id.to_string()],
            filters: vec![],
        };
        let acls = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeNetworkAcls",
                self.ctx.client.describe_network_acls(input),
            )
            .await
            .map_err(not_found)?;
        let acl = single(acls)?;
        let spec = NetworkAclSpec {
            vpc_id: acl.vpc_id,
            entries: acl.entries,
            associations: acl.associations,
            tags: acl.tags,
        };
        let status = NetworkAclStatus {
            id: Some(acl.network_acl_id),
            owner_id: acl.owner_id,
            is_default: acl.is_default,
        };
        Ok(object(resource.metadata.clone(), spec, Some(status)))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(&self, desired: &NetworkAcl, cancel: &CancellationToken) -> Result<NetworkAcl> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateNetworkAclInput {
            vpc_id: desired.spec.vpc_id.clone(),
            tags: desired.spec.tags.clone(),
        };
        let id = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateNetworkAcl",
                self.ctx.client.create_network_acl(input),
            )
            .await?;
        info!(network_acl_id = %id, "Created network ACL");

        let mut created = desired.clone();
        created.status = Some(NetworkAclStatus {
            id: Some(id.clone()),
            ..Default::default()
        });
        let latest = self.find(&created, cancel).await?;
        self.sync_entries(&desired.spec, &latest.spec, &id, cancel).await?;
        self.find(&latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &NetworkAcl,
        latest: &NetworkAcl,
        cancel: &CancellationToken,
    ) -> Result<NetworkAcl> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = acl_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if delta.different_at("vpcID") {
            return Err(Error::Terminal(
                "network ACL vpcID cannot be changed after creation".into(),
            ));
        }
        if delta.different_at("entries") || delta.different_at("associations") {
            self.sync_entries(&desired.spec, &latest.spec, id, cancel).await?;
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        self.find(latest, cancel).await
    }

    /// Subnets are handed back to the VPC default ACL first; EC2 refuses to
    /// delete an ACL that still has associations.
    #[instrument(skip_all, fields(trace_id))]
    async fn delete(&self, latest: &NetworkAcl, cancel: &CancellationToken) -> Result<NetworkAcl> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = acl_id(latest)?;
        if !latest.spec.associations.is_empty() {
            let associations = AssociationMutator {
                ctx: &self.ctx,
                cancel,
                network_acl_id: id,
                vpc_id: latest.spec.vpc_id.as_deref(),
            };
            associations.delete(latest.spec.associations.clone()).await?;
        }
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteNetworkAcl",
                self.ctx.client.delete_network_acl(id.to_string()),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}
