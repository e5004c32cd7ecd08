use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, Span};

use super::tags::sync_tags;
use super::{not_found, required, single, Context, ResourceManager};
use crate::ec2::{
    CreateManagedPrefixListInput, ManagedPrefixListApi, ManagedPrefixListDescription,
    ModifyManagedPrefixListInput, TagsApi,
};
use crate::reconcilers::{compute_delta, diff};
use crate::resources::managed_prefix_list::{
    ManagedPrefixList, ManagedPrefixListSpec, ManagedPrefixListStatus,
};
use crate::resources::object;
use crate::{telemetry, Error, OpType, Result};

pub struct ManagedPrefixListManager<C> {
    ctx: Arc<Context<C>>,
}

impl<C> ManagedPrefixListManager<C> {
    pub fn new(ctx: Arc<Context<C>>) -> Self {
        Self { ctx }
    }
}

fn prefix_list_id(resource: &ManagedPrefixList) -> Result<&str> {
    required(resource.status.as_ref().and_then(|s| s.id.as_ref()), "prefixListID")
}

fn status(list: ManagedPrefixListDescription) -> ManagedPrefixListStatus {
    ManagedPrefixListStatus {
        id: Some(list.prefix_list_id),
        arn: list.prefix_list_arn,
        owner_id: list.owner_id,
        state: list.state,
        state_message: list.state_message,
        version: list.version,
    }
}

impl<C: ManagedPrefixListApi> ManagedPrefixListManager<C> {
    async fn modify(
        &self,
        input: ModifyManagedPrefixListInput,
        cancel: &CancellationToken,
    ) -> Result<ManagedPrefixListDescription> {
        self.ctx
            .call(
                cancel,
                OpType::Update,
                "ModifyManagedPrefixList",
                self.ctx.client.modify_managed_prefix_list(input),
            )
            .await
    }

    /// EC2 rejects a modification that changes entries and the size together,
    /// and every modification puts the list in `modify-in-progress`. At most
    /// one modification is issued per pass: a size increase first, then
    /// entries and name, then a size decrease. Remaining steps requeue.
    async fn sync(
        &self,
        desired: &ManagedPrefixListSpec,
        latest: &ManagedPrefixList,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let id = prefix_list_id(latest)?;
        let version = latest.status.as_ref().and_then(|s| s.version);
        let entries = compute_delta(&desired.entries, &latest.spec.entries)?;
        let max_entries = match (desired.max_entries, latest.spec.max_entries) {
            (Some(want), Some(have)) if want != have => Some((want, want > have)),
            (Some(want), None) => Some((want, true)),
            _ => None,
        };
        let rename = desired.prefix_list_name.is_some()
            && desired.prefix_list_name != latest.spec.prefix_list_name;

        if let Some((size, true)) = max_entries {
            let modified = self
                .modify(
                    ModifyManagedPrefixListInput {
                        prefix_list_id: id.to_string(),
                        current_version: version,
                        max_entries: Some(size),
                        ..Default::default()
                    },
                    cancel,
                )
                .await?;
            debug!(version = ?modified.version, size, "Resizing prefix list");
            return Err(self.ctx.config.requeue("prefix list is being resized"));
        }

        if !entries.is_empty() || rename {
            let mut add_entries = entries.to_update;
            add_entries.extend(entries.to_add);
            let input = ModifyManagedPrefixListInput {
                prefix_list_id: id.to_string(),
                current_version: version,
                prefix_list_name: rename.then(|| desired.prefix_list_name.clone()).flatten(),
                max_entries: None,
                add_entries,
                remove_entries: entries.to_delete.into_iter().filter_map(|e| e.cidr).collect(),
            };
            self.modify(input, cancel).await?;
            if max_entries.is_some() {
                return Err(self.ctx.config.requeue("prefix list entries are being modified"));
            }
            return Ok(());
        }

        if let Some((size, false)) = max_entries {
            let input = ModifyManagedPrefixListInput {
                prefix_list_id: id.to_string(),
                current_version: version,
                max_entries: Some(size),
                ..Default::default()
            };
            self.modify(input, cancel).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: ManagedPrefixListApi + TagsApi> ResourceManager for ManagedPrefixListManager<C> {
    type Spec = ManagedPrefixListSpec;
    type Status = ManagedPrefixListStatus;

    const KIND: &'static str = "ManagedPrefixList";

    #[instrument(skip_all, fields(trace_id))]
    async fn find(
        &self,
        resource: &ManagedPrefixList,
        cancel: &CancellationToken,
    ) -> Result<ManagedPrefixList> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = prefix_list_id(resource).map_err(|_| Error::NotFound)?;
        let lists = self
            .ctx
            .call(
                cancel,
                OpType::ReadOne,
                "DescribeManagedPrefixLists",
                self.ctx.client.describe_managed_prefix_lists(vec![id.to_string()]),
            )
            .await
            .map_err(not_found)?;
        let list = single(lists)?;
        let entries = self
            .ctx
            .call(
                cancel,
                OpType::ReadMany,
                "GetManagedPrefixListEntries",
                self.ctx.client.get_managed_prefix_list_entries(id.to_string()),
            )
            .await?;
        let spec = ManagedPrefixListSpec {
            prefix_list_name: list.prefix_list_name.clone(),
            address_family: list.address_family.clone(),
            max_entries: list.max_entries,
            entries,
            tags: list.tags.clone(),
        };
        Ok(object(resource.metadata.clone(), spec, Some(status(list))))
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn create(
        &self,
        desired: &ManagedPrefixList,
        cancel: &CancellationToken,
    ) -> Result<ManagedPrefixList> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let input = CreateManagedPrefixListInput {
            prefix_list_name: desired.spec.prefix_list_name.clone(),
            address_family: desired.spec.address_family.clone(),
            max_entries: desired.spec.max_entries,
            entries: desired.spec.entries.clone(),
            tags: desired.spec.tags.clone(),
        };
        let list = self
            .ctx
            .call(
                cancel,
                OpType::Create,
                "CreateManagedPrefixList",
                self.ctx.client.create_managed_prefix_list(input),
            )
            .await?;
        info!(prefix_list_id = %list.prefix_list_id, "Created managed prefix list");

        let mut created = desired.clone();
        created.status = Some(status(list));
        self.find(&created, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn update(
        &self,
        desired: &ManagedPrefixList,
        latest: &ManagedPrefixList,
        cancel: &CancellationToken,
    ) -> Result<ManagedPrefixList> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = prefix_list_id(latest)?;
        let delta = diff(&desired.spec, &latest.spec);
        if delta.is_empty() {
            return Ok(latest.clone());
        }
        if latest.status.as_ref().is_some_and(ManagedPrefixListStatus::in_progress) {
            return Err(self.ctx.config.requeue("prefix list is being modified"));
        }
        if delta.different_at("addressFamily") {
            return Err(Error::Terminal(
                "prefix list addressFamily cannot be changed after creation".into(),
            ));
        }
        if delta.different_at("entries")
            || delta.different_at("maxEntries")
            || delta.different_at("prefixListName")
        {
            self.sync(&desired.spec, latest, cancel).await?;
        }
        if delta.different_at("tags") {
            sync_tags(&self.ctx, cancel, id, &desired.spec.tags, &latest.spec.tags).await?;
        }
        self.find(latest, cancel).await
    }

    #[instrument(skip_all, fields(trace_id))]
    async fn delete(
        &self,
        latest: &ManagedPrefixList,
        cancel: &CancellationToken,
    ) -> Result<ManagedPrefixList> {
        if let Some(trace_id) = telemetry::get_trace_id() {
            Span::current().record("trace_id", field::display(&trace_id));
        }
        let id = prefix_list_id(latest)?;
        if latest.status.as_ref().is_some_and(ManagedPrefixListStatus::in_progress) {
            return Err(self.ctx.config.requeue("prefix list is being modified"));
        }
        self.ctx
            .call(
                cancel,
                OpType::Delete,
                "DeleteManagedPrefixList",
                self.ctx.client.delete_managed_prefix_list(id.to_string()),
            )
            .await
            .or_else(|e| match not_found(e) {
                Error::NotFound => Ok(()),
                e => Err(e),
            })?;
        Ok(latest.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::controllers::test_support::{context, resource};
    use crate::resources::managed_prefix_list::PrefixListEntry;

    fn entry(cidr: &str, description: &str) -> PrefixListEntry {
        PrefixListEntry {
            cidr: Some(cidr.into()),
            description: Some(description.into()),
        }
    }

    fn list(max_entries: i64, entries: Vec<PrefixListEntry>, state: &str) -> ManagedPrefixList {
        resource(
            ManagedPrefixListSpec {
                prefix_list_name: Some("corp".into()),
                address_family: Some("IPv4".into()),
                max_entries: Some(max_entries),
                entries,
                tags: vec![],
            },
            Some(ManagedPrefixListStatus {
                id: Some("pl-1".into()),
                state: Some(state.into()),
                version: Some(3),
                ..Default::default()
            }),
        )
    }

    fn described() -> Vec<ManagedPrefixListDescription> {
        vec![ManagedPrefixListDescription {
            prefix_list_id: "pl-1".into(),
            state: Some("modify-in-progress".into()),
            version: Some(4),
            ..Default::default()
        }]
    }

    #[tokio::test]
    async fn test_in_progress_list_is_requeued() {
        let ctx = context();
        let manager = ManagedPrefixListManager::new(ctx.clone());
        let desired = list(10, vec![entry("10.0.0.0/8", "corp")], "create-complete");
        let latest = list(10, vec![], "modify-in-progress");
        let err = manager
            .update(&desired, &latest, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Requeue { .. }));
        assert!(ctx.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_entries_in_one_versioned_call() {
        let ctx = context();
        ctx.client.push_prefix_lists(described());
        let manager = ManagedPrefixListManager::new(ctx.clone());
        let desired = list(
            10,
            vec![entry("10.0.0.0/8", "corp"), entry("192.168.0.0/16", "lab")],
            "create-complete",
        );
        let latest = list(
            10,
            vec![entry("10.0.0.0/8", "old"), entry("172.16.0.0/12", "vpn")],
            "modify-complete",
        );
        manager
            .update(&desired, &latest, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            ctx.client.inputs("ModifyManagedPrefixList"),
            vec![json!({
                "PrefixListId": "pl-1",
                "CurrentVersion": 3,
                "PrefixListName": null,
                "MaxEntries": null,
                "AddEntries": [
                    {"cidr": "10.0.0.0/8", "description": "corp"},
                    {"cidr": "192.168.0.0/16", "description": "lab"},
                ],
                "RemoveEntries": ["172.16.0.0/12"],
            })]
        );
    }

    #[tokio::test]
    async fn test_growth_comes_before_entries() {
        let ctx = context();
        let manager = ManagedPrefixListManager::new(ctx.clone());
        let desired = list(20, vec![entry("10.0.0.0/8", "corp")], "create-complete");
        let latest = list(10, vec![], "create-complete");
        let err = manager
            .update(&desired, &latest, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Requeue { .. }));
        let modified = ctx.client.inputs("ModifyManagedPrefixList");
        assert_eq!(modified.len(), 1);
        assert_eq!(modified[0]["MaxEntries"], json!(20));
        assert_eq!(modified[0]["AddEntries"], json!([]));
    }

    #[tokio::test]
    async fn test_shrink_comes_after_entries() {
        let ctx = context();
        ctx.client.push_prefix_lists(described());
        let manager = ManagedPrefixListManager::new(ctx.clone());
        let desired = list(5, vec![entry("10.0.0.0/8", "corp")], "create-complete");
        let latest = list(
            10,
            vec![entry("10.0.0.0/8", "corp"), entry("172.16.0.0/12", "vpn")],
            "modify-complete",
        );
        let err = manager
            .update(&desired, &latest, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Requeue { .. }));
        let modified = ctx.client.inputs("ModifyManagedPrefixList");
        assert_eq!(modified.len(), 1);
        assert_eq!(modified[0]["RemoveEntries"], json!(["172.16.0.0/12"]));
        assert_eq!(modified[0]["MaxEntries"], json!(null));

        // next pass, entries already converged
        let latest = list(10, vec![entry("10.0.0.0/8", "corp")], "modify-complete");
        manager
            .update(&desired, &latest, &CancellationToken::new())
            .await
            .unwrap();
        let modified = ctx.client.inputs("ModifyManagedPrefixList");
        assert_eq!(modified.len(), 2);
        assert_eq!(modified[1]["MaxEntries"], json!(5));
    }

    #[tokio::test]
    async fn test_address_family_is_immutable() {
        let ctx = context();
        let manager = ManagedPrefixListManager::new(ctx.clone());
        let mut desired = list(10, vec![], "create-complete");
        desired.spec.address_family = Some("IPv6".into());
        let err = manager
            .update(&desired, &list(10, vec![], "create-complete"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn test_find_reads_entries() {
        let ctx = context();
        ctx.client.push_prefix_lists(described());
        ctx.client
            .push_prefix_list_entries(vec![entry("10.0.0.0/8", "corp")]);
        let manager = ManagedPrefixListManager::new(ctx.clone());
        let found = manager
            .find(&list(10, vec![], "create-complete"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(found.spec.entries, vec![entry("10.0.0.0/8", "corp")]);
        let status = found.status.unwrap();
        assert_eq!(status.version, Some(4));
        assert!(status.in_progress());
    }

    #[tokio::test]
    async fn test_delete_waits_for_modification() {
        let ctx = context();
        let manager = ManagedPrefixListManager::new(ctx.clone());
        let err = manager
            .delete(&list(10, vec![], "modify-in-progress"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Requeue { .. }));
        manager
            .delete(&list(10, vec![], "modify-complete"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(ctx.client.mutations(), vec!["DeleteManagedPrefixList"]);
    }
}
