use async_trait::async_trait;
use serde::Serialize;

use super::ApiError;
use crate::resources::Tag;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTagsInput {
    pub resources: Vec<String>,
    pub tags: Vec<Tag>,
}

/// Tags are removed by key regardless of their current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteTagsInput {
    pub resources: Vec<String>,
    pub tags: Vec<Tag>,
}

#[async_trait]
pub trait TagsApi: Send + Sync {
    async fn create_tags(&self, input: CreateTagsInput) -> Result<(), ApiError>;
    async fn delete_tags(&self, input: DeleteTagsInput) -> Result<(), ApiError>;
}
