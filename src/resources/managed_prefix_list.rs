use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, DuplicateKeys, FieldDelta, Subresource, SyncPolicy, UpdateMode};

pub type ManagedPrefixList = Object<ManagedPrefixListSpec, ManagedPrefixListStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedPrefixListSpec {
    pub prefix_list_name: Option<String>,
    /// `IPv4` or `IPv6`
    pub address_family: Option<String>,
    pub max_entries: Option<i64>,
    #[serde(default)]
    pub entries: Vec<PrefixListEntry>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for ManagedPrefixListSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(
            prefix,
            "prefixListName",
            &self.prefix_list_name,
            &other.prefix_list_name,
        );
        delta.compare_field(prefix, "addressFamily", &self.address_family, &other.address_family);
        delta.compare_field(prefix, "maxEntries", &self.max_entries, &other.max_entries);
        delta.compare_collection(prefix, "entries", &self.entries, &other.entries);
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedPrefixListStatus {
    #[serde(rename = "prefixListID")]
    pub id: Option<String>,
    #[serde(rename = "prefixListARN")]
    pub arn: Option<String>,
    pub owner_id: Option<String>,
    pub state: Option<String>,
    pub state_message: Option<String>,
    pub version: Option<i64>,
}

impl ManagedPrefixListStatus {
    /// `create-in-progress`, `modify-in-progress`, `restore-in-progress` and
    /// `delete-in-progress` lists reject modifications.
    pub fn in_progress(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.ends_with("-in-progress"))
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrefixListEntry {
    pub cidr: Option<String>,
    pub description: Option<String>,
}

impl Compare for PrefixListEntry {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "cidr", &self.cidr, &other.cidr);
        delta.compare_field(prefix, "description", &self.description, &other.description);
    }
}

/// Adding an existing CIDR overwrites its description, so a changed entry is
/// an in-place update.
impl Subresource for PrefixListEntry {
    type Key = String;
    const KIND: &'static str = "prefix list entry";
    const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::InPlace, DuplicateKeys::Reject);

    fn key(&self) -> String {
        self.cidr.clone().unwrap_or_default()
    }

    fn validate(&self) -> Result<(), String> {
        match self.cidr.as_deref() {
            Some(c) if !c.is_empty() => Ok(()),
            _ => Err("cidr is required".into()),
        }
    }
}
