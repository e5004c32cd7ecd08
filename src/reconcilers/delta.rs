use std::fmt::Debug;
use std::hash::Hash;

use fnv::{FnvHashMap, FnvHashSet};
use serde::Serialize;

use super::compare::{diff, join, Compare, FieldDelta};
use crate::{Error, Result};

/// How a changed payload under an unchanged natural key reaches EC2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    /// No in-place verb exists; the old item is deleted and the new one added.
    Replace,
    /// The item is replaced in place and reported in `to_update`.
    InPlace,
}

/// What to do with desired items that share a natural key but differ in payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateKeys {
    Reject,
    Allow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncPolicy {
    pub update: UpdateMode,
    pub duplicates: DuplicateKeys,
}

impl SyncPolicy {
    pub const fn new(update: UpdateMode, duplicates: DuplicateKeys) -> Self {
        Self { update, duplicates }
    }
}

/// A member of a collection that is reconciled item by item.
pub trait Subresource: Compare + Clone + Serialize + Send + Sync {
    /// The fields that identify the same logical entity on both sides.
    type Key: Eq + Hash + Clone + Debug;

    /// Name used in validation errors.
    const KIND: &'static str;

    const POLICY: SyncPolicy;

    /// Fields that EC2 assigns and that never count as a payload change.
    const IGNORED_FIELDS: &'static [&'static str] = &[];

    fn key(&self) -> Self::Key;

    /// Implicit or system-managed items that are never added or removed.
    fn is_default(&self) -> bool {
        false
    }

    /// Checks a desired item before anything is sent to EC2.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn matches(&self, other: &Self) -> bool {
        !diff(self, other).different_except(Self::IGNORED_FIELDS)
    }
}

/// The classification of desired and latest items.
///
/// `to_update` holds desired items and is only populated under
/// [`UpdateMode::InPlace`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDelta<T> {
    pub to_delete: Vec<T>,
    pub to_update: Vec<T>,
    pub to_add: Vec<T>,
}

impl<T> Default for CollectionDelta<T> {
    fn default() -> Self {
        Self {
            to_delete: Vec::new(),
            to_update: Vec::new(),
            to_add: Vec::new(),
        }
    }
}

impl<T> CollectionDelta<T> {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_update.is_empty() && self.to_add.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_delete.len() + self.to_update.len() + self.to_add.len()
    }
}

type Index<'a, T> = FnvHashMap<<T as Subresource>::Key, Vec<&'a T>>;

/// Compute which items must be deleted, updated and added for `latest` to
/// converge on `desired`.
///
/// Default items are dropped from both sides and identical repeats are merged.
/// Items keep their input order: additions and updates follow `desired`,
/// deletions follow `latest`.
pub fn compute_delta<T: Subresource>(desired: &[T], latest: &[T]) -> Result<CollectionDelta<T>> {
    let (desired, desired_index) = normalize(desired, true)?;
    let (latest, latest_index) = normalize(latest, false)?;

    let mut to_add: Vec<T> = desired
        .iter()
        .filter(|d| !has_match(&latest_index, d))
        .map(|d| (*d).clone())
        .collect();
    let mut to_delete: Vec<T> = latest
        .iter()
        .filter(|l| !has_match(&desired_index, l))
        .map(|l| (*l).clone())
        .collect();
    let mut to_update = Vec::new();

    if T::POLICY.update == UpdateMode::InPlace {
        let deleted: FnvHashSet<T::Key> = to_delete.iter().map(|i| i.key()).collect();
        let (update, add): (Vec<T>, Vec<T>) = to_add
            .into_iter()
            .partition(|d| deleted.contains(&d.key()));
        let updated: FnvHashSet<T::Key> = update.iter().map(|i| i.key()).collect();
        to_delete.retain(|l| !updated.contains(&l.key()));
        to_update = update;
        to_add = add;
    }

    Ok(CollectionDelta {
        to_delete,
        to_update,
        to_add,
    })
}

/// [`compute_delta`] for a collection the desired state may leave unset.
/// An unset collection is not managed and yields an empty delta.
pub fn compute_desired_delta<T: Subresource>(
    desired: &Option<Vec<T>>,
    latest: &Option<Vec<T>>,
) -> Result<CollectionDelta<T>> {
    match desired {
        Some(desired) => compute_delta(desired, latest.as_deref().unwrap_or_default()),
        None => Ok(CollectionDelta::default()),
    }
}

fn normalize<T: Subresource>(items: &[T], desired: bool) -> Result<(Vec<&T>, Index<'_, T>)> {
    let mut kept = Vec::with_capacity(items.len());
    let mut index: Index<'_, T> = FnvHashMap::default();
    for item in items.iter().filter(|i| !i.is_default()) {
        if desired {
            item.validate().map_err(|m| Error::invalid(T::KIND, m))?;
        }
        let key = item.key();
        let bucket = index.entry(key.clone()).or_default();
        if bucket.iter().any(|existing| existing.matches(item)) {
            continue;
        }
        if desired && T::POLICY.duplicates == DuplicateKeys::Reject && !bucket.is_empty() {
            return Err(Error::invalid(
                T::KIND,
                format!("multiple entries share the key {key:?} with different values"),
            ));
        }
        bucket.push(item);
        kept.push(item);
    }
    Ok((kept, index))
}

fn has_match<T: Subresource>(index: &Index<'_, T>, item: &T) -> bool {
    index
        .get(&item.key())
        .is_some_and(|bucket| bucket.iter().any(|candidate| candidate.matches(item)))
}

impl FieldDelta {
    /// Order-insensitive comparison of sub-resource collections.
    ///
    /// Default items on either side are not managed and never differ, and
    /// items match the way [`compute_delta`] matches them.
    pub fn compare_subresources<T: Subresource>(
        &mut self,
        prefix: &str,
        field: &str,
        a: &[T],
        b: &[T],
    ) {
        let a: Vec<&T> = a.iter().filter(|i| !i.is_default()).collect();
        let b: Vec<&T> = b.iter().filter(|i| !i.is_default()).collect();
        let contains = |haystack: &[&T], needle: &T| haystack.iter().any(|h| h.matches(needle));
        let equal = a.iter().all(|x| contains(&b, x)) && b.iter().all(|x| contains(&a, x));
        if !equal {
            self.add(
                join(prefix, field),
                serde_json::to_value(&a).unwrap_or_default(),
                serde_json::to_value(&b).unwrap_or_default(),
            );
        }
    }
}

impl Subresource for String {
    type Key = String;
    const KIND: &'static str = "identifier";
    const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::Replace, DuplicateKeys::Allow);

    fn key(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reconcilers::compare::FieldDelta;

    /// Apply a delta to `latest` in memory.
    pub(crate) fn apply<T: Subresource>(latest: &[T], delta: &CollectionDelta<T>) -> Vec<T> {
        let mut out: Vec<T> = latest
            .iter()
            .filter(|l| !l.is_default())
            .filter(|l| !delta.to_delete.iter().any(|d| d.matches(l)))
            .cloned()
            .collect();
        for updated in &delta.to_update {
            for item in out.iter_mut().filter(|i| i.key() == updated.key()) {
                *item = updated.clone();
            }
        }
        out.extend(delta.to_add.iter().cloned());
        out
    }

    pub(crate) fn equivalent<T: Subresource>(a: &[T], b: &[T]) -> bool {
        let a: Vec<&T> = a.iter().filter(|i| !i.is_default()).collect();
        let b: Vec<&T> = b.iter().filter(|i| !i.is_default()).collect();
        a.iter().all(|x| b.iter().any(|y| x.matches(y)))
            && b.iter().all(|y| a.iter().any(|x| x.matches(y)))
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    struct Entry {
        number: Option<i64>,
        egress: bool,
        action: Option<String>,
        cidr: Option<String>,
        id: Option<String>,
    }

    impl Compare for Entry {
        fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
            delta.compare_field(prefix, "number", &self.number, &other.number);
            delta.compare_field(prefix, "egress", &self.egress, &other.egress);
            delta.compare_ignore_case(prefix, "action", &self.action, &other.action);
            delta.compare_field(prefix, "cidr", &self.cidr, &other.cidr);
            delta.compare_field(prefix, "id", &self.id, &other.id);
        }
    }

    impl Subresource for Entry {
        type Key = (bool, i64);
        const KIND: &'static str = "entry";
        const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::InPlace, DuplicateKeys::Reject);
        const IGNORED_FIELDS: &'static [&'static str] = &["id"];

        fn key(&self) -> (bool, i64) {
            (self.egress, self.number.unwrap_or_default())
        }

        fn is_default(&self) -> bool {
            self.number == Some(32767)
        }

        fn validate(&self) -> Result<(), String> {
            match self.number {
                Some(_) => Ok(()),
                None => Err("ruleNumber is required".into()),
            }
        }
    }

    fn entry(number: i64, egress: bool, action: &str, cidr: &str) -> Entry {
        Entry {
            number: Some(number),
            egress,
            action: Some(action.into()),
            cidr: Some(cidr.into()),
            id: None,
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    struct Perm {
        port: i64,
        peer: String,
    }

    impl Compare for Perm {
        fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
            delta.compare_field(prefix, "port", &self.port, &other.port);
            delta.compare_field(prefix, "peer", &self.peer, &other.peer);
        }
    }

    impl Subresource for Perm {
        type Key = i64;
        const KIND: &'static str = "perm";
        const POLICY: SyncPolicy = SyncPolicy::new(UpdateMode::Replace, DuplicateKeys::Allow);

        fn key(&self) -> i64 {
            self.port
        }
    }

    fn perm(port: i64, peer: &str) -> Perm {
        Perm {
            port,
            peer: peer.into(),
        }
    }

    #[test]
    fn test_identity_is_empty() {
        let d = vec![
            entry(100, false, "allow", "10.0.0.0/8"),
            entry(100, true, "deny", "0.0.0.0/0"),
        ];
        assert!(compute_delta(&d, &d).unwrap().is_empty());

        let mut reversed = d.clone();
        reversed.reverse();
        assert!(compute_delta(&d, &reversed).unwrap().is_empty());
    }

    #[test]
    fn test_in_place_update() {
        let desired = vec![entry(100, false, "deny", "10.0.0.0/8")];
        let latest = vec![entry(100, false, "allow", "10.0.0.0/8")];
        let delta = compute_delta(&desired, &latest).unwrap();
        assert!(delta.to_add.is_empty());
        assert!(delta.to_delete.is_empty());
        assert_eq!(delta.to_update, desired);
    }

    #[test]
    fn test_ignored_fields_and_case() {
        let desired = vec![entry(100, false, "allow", "10.0.0.0/8")];
        let mut observed = entry(100, false, "ALLOW", "10.0.0.0/8");
        observed.id = Some("assigned".into());
        assert!(compute_delta(&desired, &[observed]).unwrap().is_empty());
    }

    #[test]
    fn test_defaults_are_never_touched() {
        let desired = vec![entry(32767, false, "allow", "0.0.0.0/0")];
        let latest = vec![
            entry(32767, false, "deny", "0.0.0.0/0"),
            entry(32767, true, "deny", "0.0.0.0/0"),
        ];
        assert!(compute_delta(&desired, &latest).unwrap().is_empty());
        assert!(compute_delta(&[], &latest).unwrap().is_empty());
        assert!(compute_delta(&desired, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let desired = vec![
            entry(100, false, "allow", "10.0.0.0/8"),
            entry(100, false, "deny", "10.0.0.0/8"),
        ];
        let err = compute_delta(&desired, &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidDesiredState { kind: "entry", .. }));
    }

    #[test]
    fn test_identical_duplicates_merged() {
        let desired = vec![
            entry(100, false, "allow", "10.0.0.0/8"),
            entry(100, false, "allow", "10.0.0.0/8"),
        ];
        let delta = compute_delta(&desired, &[]).unwrap();
        assert_eq!(delta.to_add.len(), 1);
    }

    #[test]
    fn test_validation_precedes_everything() {
        let mut invalid = entry(100, false, "allow", "10.0.0.0/8");
        invalid.number = None;
        assert!(matches!(
            compute_delta(&[invalid], &[]).unwrap_err(),
            Error::InvalidDesiredState { .. }
        ));
    }

    #[test]
    fn test_replace_keeps_both_sides() {
        let delta = compute_delta(&[perm(80, "10.0.0.0/8")], &[perm(80, "0.0.0.0/0")]).unwrap();
        assert_eq!(delta.to_delete, vec![perm(80, "0.0.0.0/0")]);
        assert_eq!(delta.to_add, vec![perm(80, "10.0.0.0/8")]);
        assert!(delta.to_update.is_empty());
    }

    #[test]
    fn test_allowed_duplicates_coexist() {
        let desired = vec![perm(80, "10.0.0.0/8"), perm(80, "192.168.0.0/16")];
        let latest = vec![perm(80, "192.168.0.0/16")];
        let delta = compute_delta(&desired, &latest).unwrap();
        assert_eq!(delta.to_add, vec![perm(80, "10.0.0.0/8")]);
        assert!(delta.to_delete.is_empty());
    }

    #[test]
    fn test_default_subresources_never_differ() {
        let managed = vec![entry(100, false, "allow", "10.0.0.0/8")];
        let mut observed = managed.clone();
        observed.push(entry(32767, true, "deny", "0.0.0.0/0"));
        observed[0].id = Some("assigned".into());

        let mut delta = FieldDelta::default();
        delta.compare_subresources("spec", "entries", &managed, &observed);
        assert!(delta.is_empty());

        delta.compare_subresources("spec", "entries", &[], &observed);
        assert_eq!(delta.paths().collect::<Vec<_>>(), vec!["spec.entries"]);
    }

    #[test]
    fn test_unset_collection_is_unmanaged() {
        let latest = Some(vec!["sg-1".to_string()]);
        assert!(compute_desired_delta(&None, &latest).unwrap().is_empty());
        let delta = compute_desired_delta(&Some(vec![]), &latest).unwrap();
        assert_eq!(delta.to_delete, vec!["sg-1".to_string()]);
        let delta = compute_desired_delta(&Some(vec!["sg-2".to_string()]), &None).unwrap();
        assert_eq!(delta.to_add, vec!["sg-2".to_string()]);
    }

    #[test]
    fn test_string_sets() {
        let desired: Vec<String> = vec!["vpc-1".into(), "vpc-2".into()];
        let latest: Vec<String> = vec!["vpc-2".into(), "vpc-3".into()];
        let delta = compute_delta(&desired, &latest).unwrap();
        assert_eq!(delta.to_add, vec!["vpc-1".to_string()]);
        assert_eq!(delta.to_delete, vec!["vpc-3".to_string()]);
    }

    #[test]
    fn test_convergence_and_minimality() {
        let cases: Vec<(Vec<Entry>, Vec<Entry>)> = vec![
            (vec![], vec![]),
            (vec![entry(1, false, "allow", "a")], vec![]),
            (vec![], vec![entry(1, false, "allow", "a")]),
            (
                vec![entry(1, false, "allow", "a"), entry(2, true, "deny", "b")],
                vec![entry(2, true, "allow", "b"), entry(3, false, "allow", "c")],
            ),
            (
                vec![entry(1, false, "allow", "a"), entry(1, true, "allow", "a")],
                vec![
                    entry(1, false, "allow", "b"),
                    entry(32767, false, "deny", "0.0.0.0/0"),
                ],
            ),
        ];
        for (desired, latest) in cases {
            let delta = compute_delta(&desired, &latest).unwrap();
            let converged = apply(&latest, &delta);
            assert!(equivalent(&converged, &desired), "{desired:?} vs {converged:?}");

            let deleted: Vec<_> = delta.to_delete.iter().map(|i| i.key()).collect();
            assert!(delta.to_add.iter().all(|a| !deleted.contains(&a.key())));
        }

        let cases: Vec<(Vec<Perm>, Vec<Perm>)> = vec![
            (vec![perm(22, "a"), perm(443, "a")], vec![perm(22, "a")]),
            (vec![perm(22, "a")], vec![perm(22, "b"), perm(22, "a"), perm(80, "c")]),
            (vec![perm(22, "a"), perm(22, "a")], vec![]),
        ];
        for (desired, latest) in cases {
            let delta = compute_delta(&desired, &latest).unwrap();
            assert!(equivalent(&apply(&latest, &delta), &desired));
            for added in &delta.to_add {
                assert!(!delta.to_delete.iter().any(|d| d == added));
            }
        }
    }
}
