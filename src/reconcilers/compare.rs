use serde::Serialize;
use serde_json::Value;

/// A single field that differs between two values
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Difference {
    pub path: String,
    pub a: Value,
    pub b: Value,
}

/// The field-level differences between two values of the same type.
///
/// Paths are dotted camelCase field names (`spec.ingressRules`). Absent optional
/// fields compare equal to each other and different from any present value.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FieldDelta {
    pub differences: Vec<Difference>,
}

/// Structural comparison that reports every differing field.
pub trait Compare {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta);
}

/// Compare two values and return their differences.
pub fn diff<T: Compare + ?Sized>(a: &T, b: &T) -> FieldDelta {
    let mut delta = FieldDelta::default();
    a.compare(b, "", &mut delta);
    delta
}

pub(crate) fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn value<T: Serialize + ?Sized>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or_default()
}

impl FieldDelta {
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn add(&mut self, path: String, a: Value, b: Value) {
        self.differences.push(Difference { path, a, b });
    }

    /// True when `path` or anything nested below it differs.
    pub fn different_at(&self, path: &str) -> bool {
        self.differences.iter().any(|d| covers(path, &d.path))
    }

    /// True when some difference is not covered by any of `ignored`.
    pub fn different_except(&self, ignored: &[&str]) -> bool {
        self.differences
            .iter()
            .any(|d| !ignored.iter().any(|i| covers(i, &d.path)))
    }

    /// Paths of all differences, in discovery order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.differences.iter().map(|d| d.path.as_str())
    }

    pub fn compare_field<T>(&mut self, prefix: &str, field: &str, a: &T, b: &T)
    where
        T: PartialEq + Serialize + ?Sized,
    {
        if a != b {
            self.add(join(prefix, field), value(a), value(b));
        }
    }

    /// Null-safe comparison of optional strings ignoring ASCII case.
    pub fn compare_ignore_case(
        &mut self,
        prefix: &str,
        field: &str,
        a: &Option<String>,
        b: &Option<String>,
    ) {
        let equal = match (a, b) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        if !equal {
            self.add(join(prefix, field), value(a), value(b));
        }
    }

    pub fn compare_nested<T: Compare + Serialize>(
        &mut self,
        prefix: &str,
        field: &str,
        a: &Option<T>,
        b: &Option<T>,
    ) {
        let path = join(prefix, field);
        match (a, b) {
            (Some(a), Some(b)) => a.compare(b, &path, self),
            (None, None) => {}
            _ => self.add(path, value(a), value(b)),
        }
    }

    /// Like [`compare_field`](Self::compare_field), but an unset `a` leaves the
    /// field unmanaged and never differs.
    pub fn compare_desired<T>(&mut self, prefix: &str, field: &str, a: &Option<T>, b: &Option<T>)
    where
        T: PartialEq + Serialize,
    {
        if a.is_some() {
            self.compare_field(prefix, field, a, b);
        }
    }

    /// Like [`compare_nested`](Self::compare_nested) for a block `a` may leave unset.
    pub fn compare_desired_nested<T: Compare + Serialize>(
        &mut self,
        prefix: &str,
        field: &str,
        a: &Option<T>,
        b: &Option<T>,
    ) {
        if a.is_some() {
            self.compare_nested(prefix, field, a, b);
        }
    }

    /// Like [`compare_set`](Self::compare_set) for a list `a` may leave unset.
    /// An unset `b` compares as empty.
    pub fn compare_desired_set<T>(
        &mut self,
        prefix: &str,
        field: &str,
        a: &Option<Vec<T>>,
        b: &Option<Vec<T>>,
    ) where
        T: Ord + Serialize,
    {
        if let Some(a) = a {
            self.compare_set(prefix, field, a, b.as_deref().unwrap_or_default());
        }
    }

    /// Ordered, element-wise list comparison. Lists of different length are
    /// reported once at the list path.
    pub fn compare_list<T: Compare + Serialize>(
        &mut self,
        prefix: &str,
        field: &str,
        a: &[T],
        b: &[T],
    ) {
        let path = join(prefix, field);
        if a.len() != b.len() {
            self.add(path, value(a), value(b));
            return;
        }
        let mut nested = FieldDelta::default();
        for (a, b) in a.iter().zip(b) {
            a.compare(b, &path, &mut nested);
        }
        if !nested.is_empty() {
            self.add(path, value(a), value(b));
        }
    }

    /// Order-insensitive comparison of plain values.
    pub fn compare_set<T>(&mut self, prefix: &str, field: &str, a: &[T], b: &[T])
    where
        T: Ord + Serialize,
    {
        let mut sorted_a: Vec<&T> = a.iter().collect();
        let mut sorted_b: Vec<&T> = b.iter().collect();
        sorted_a.sort();
        sorted_a.dedup();
        sorted_b.sort();
        sorted_b.dedup();
        if sorted_a != sorted_b {
            self.add(join(prefix, field), value(a), value(b));
        }
    }

    /// Order-insensitive comparison of structured values using `Compare`.
    pub fn compare_collection<T: Compare + Serialize>(
        &mut self,
        prefix: &str,
        field: &str,
        a: &[T],
        b: &[T],
    ) {
        let contains =
            |haystack: &[T], needle: &T| haystack.iter().any(|h| diff(h, needle).is_empty());
        let equal = a.iter().all(|x| contains(b, x)) && b.iter().all(|x| contains(a, x));
        if !equal {
            self.add(join(prefix, field), value(a), value(b));
        }
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

impl Compare for String {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        if self != other {
            delta.add(prefix.to_string(), value(self), value(other));
        }
    }
}
