use async_trait::async_trait;
use tracing::debug;

use super::delta::{CollectionDelta, Subresource};
use crate::Result;

/// Realizes one kind of collection delta against EC2.
///
/// Each method receives the whole batch; implementations decide whether that
/// is one call or one call per item.
#[async_trait]
pub trait Mutator<T: Send + 'static>: Send + Sync {
    async fn delete(&self, items: Vec<T>) -> Result<()>;

    /// Only called for kinds reconciled in place. Kinds without an in-place
    /// verb never produce updates.
    async fn update(&self, items: Vec<T>) -> Result<()> {
        self.add(items).await
    }

    async fn add(&self, items: Vec<T>) -> Result<()>;
}

/// Apply a delta in delete, update, add order. The first failure stops the
/// pass; calls that already succeeded are not undone.
pub async fn apply_delta<T, M>(mutator: &M, delta: CollectionDelta<T>) -> Result<()>
where
    T: Subresource + 'static,
    M: Mutator<T> + ?Sized,
{
    debug!(
        kind = T::KIND,
        delete = delta.to_delete.len(),
        update = delta.to_update.len(),
        add = delta.to_add.len(),
        "Applying delta"
    );
    if !delta.to_delete.is_empty() {
        mutator.delete(delta.to_delete).await?;
    }
    if !delta.to_update.is_empty() {
        mutator.update(delta.to_update).await?;
    }
    if !delta.to_add.is_empty() {
        mutator.add(delta.to_add).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::Error;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(&'static str, Vec<String>)>>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn record(&self, op: &'static str, items: Vec<String>) -> Result<()> {
            self.calls.lock().unwrap().push((op, items));
            if self.fail_on == Some(op) {
                return Err(Error::Terminal(format!("{op} failed")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Mutator<String> for Recorder {
        async fn delete(&self, items: Vec<String>) -> Result<()> {
            self.record("delete", items)
        }

        async fn add(&self, items: Vec<String>) -> Result<()> {
            self.record("add", items)
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_deletes_before_adds() {
        let recorder = Recorder::default();
        let delta = CollectionDelta {
            to_delete: strings(&["old"]),
            to_update: vec![],
            to_add: strings(&["new"]),
        };
        apply_delta(&recorder, delta).await.unwrap();
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![("delete", strings(&["old"])), ("add", strings(&["new"]))]
        );
    }

    #[tokio::test]
    async fn test_empty_sets_are_skipped() {
        let recorder = Recorder::default();
        apply_delta(&recorder, CollectionDelta::<String>::default())
            .await
            .unwrap();
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_stops_pass() {
        let recorder = Recorder {
            fail_on: Some("delete"),
            ..Default::default()
        };
        let delta = CollectionDelta {
            to_delete: strings(&["old"]),
            to_update: vec![],
            to_add: strings(&["new"]),
        };
        assert!(apply_delta(&recorder, delta).await.is_err());
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }
}
