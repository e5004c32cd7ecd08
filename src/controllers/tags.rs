use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::Context;
use crate::ec2::{CreateTagsInput, DeleteTagsInput, TagsApi};
use crate::reconcilers::{apply_delta, compute_delta, Mutator};
use crate::resources::Tag;
use crate::{OpType, Result};

struct TagMutator<'a, C> {
    ctx: &'a Context<C>,
    cancel: &'a CancellationToken,
    resource_id: &'a str,
}

#[async_trait]
impl<'a, C: TagsApi> Mutator<Tag> for TagMutator<'a, C> {
    async fn delete(&self, items: Vec<Tag>) -> Result<()> {
        let input = DeleteTagsInput {
            resources: vec![self.resource_id.to_string()],
            tags: items
                .into_iter()
                .map(|t| Tag {
                    key: t.key,
                    value: None,
                })
                .collect(),
        };
        self.ctx
            .call(self.cancel, OpType::Update, "DeleteTags", self.ctx.client.delete_tags(input))
            .await
    }

    /// CreateTags overwrites the value of an existing key, so updates take
    /// the same path as additions.
    async fn add(&self, items: Vec<Tag>) -> Result<()> {
        let input = CreateTagsInput {
            resources: vec![self.resource_id.to_string()],
            tags: items,
        };
        self.ctx
            .call(self.cancel, OpType::Update, "CreateTags", self.ctx.client.create_tags(input))
            .await
    }
}

/// Converge the tags of an EC2 resource on `desired`. `aws:` tags are left alone.
pub async fn sync_tags<C: TagsApi>(
    ctx: &Context<C>,
    cancel: &CancellationToken,
    resource_id: &str,
    desired: &[Tag],
    latest: &[Tag],
) -> Result<()> {
    let delta = compute_delta(desired, latest)?;
    let mutator = TagMutator {
        ctx,
        cancel,
        resource_id,
    };
    apply_delta(&mutator, delta).await
}
