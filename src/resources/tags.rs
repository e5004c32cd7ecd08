use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::reconcilers::{Compare, DuplicateKeys, FieldDelta, Subresource, SyncPolicy, UpdateMode};

/// Keys with this prefix are owned by AWS and cannot be changed by users.
pub const SYSTEM_TAG_PREFIX: &str = "aws:";

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub key: Option<String>,
    pub value: Option<String>,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }
}

impl Compare for Tag {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "key", &self.key, &other.key);
        // EC2 reports an unset value as the empty string
        delta.compare_field(
            prefix,
            "value",
            self.value.as_deref().unwrap_or_default(),
            other.value.as_deref().unwrap_or_default(),
        );
    }
}

impl Subresource for Tag {
    type Key = String;
    const KIND: &'static str = "tag";
    const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::InPlace, DuplicateKeys::Reject);

    fn key(&self) -> String {
        self.key.clone().unwrap_or_default()
    }

    fn is_default(&self) -> bool {
        self.key
            .as_deref()
            .is_some_and(|k| k.starts_with(SYSTEM_TAG_PREFIX))
    }

    fn validate(&self) -> Result<(), String> {
        match self.key.as_deref() {
            Some(k) if !k.is_empty() => Ok(()),
            _ => Err("tag key must not be empty".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcilers::compute_delta;
    use crate::Error;

    #[test]
    fn test_changed_value_is_upserted() {
        let desired = vec![Tag::new("env", "prod"), Tag::new("team", "net")];
        let latest = vec![Tag::new("env", "dev"), Tag::new("owner", "me")];
        let delta = compute_delta(&desired, &latest).unwrap();
        assert_eq!(delta.to_update, vec![Tag::new("env", "prod")]);
        assert_eq!(delta.to_add, vec![Tag::new("team", "net")]);
        assert_eq!(delta.to_delete, vec![Tag::new("owner", "me")]);
    }

    #[test]
    fn test_missing_value_equals_empty() {
        let desired = vec![Tag {
            key: Some("env".into()),
            value: None,
        }];
        let latest = vec![Tag::new("env", "")];
        assert!(compute_delta(&desired, &latest).unwrap().is_empty());
    }

    #[test]
    fn test_system_tags_ignored() {
        let latest = vec![Tag::new("aws:cloudformation:stack-name", "x")];
        assert!(compute_delta(&[], &latest).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_keys_and_empty_keys_rejected() {
        let desired = vec![Tag::new("env", "a"), Tag::new("env", "b")];
        assert!(matches!(
            compute_delta(&desired, &[]).unwrap_err(),
            Error::InvalidDesiredState { kind: "tag", .. }
        ));
        assert!(compute_delta(&[Tag::default()], &[]).is_err());
    }
}
