//! Unordered record collections with structural equality.
//!
//! A [`RecordSet`] stores each record under a canonical text form. Object
//! keys are written in sorted order at every depth and `-0.0` is written as
//! `0.0`, so two records share a form exactly when they are deeply equal,
//! whatever order their fields were inserted in and whichever `serde_json`
//! features are enabled. Iteration follows the canonical form, which makes
//! every operation deterministic.
//!
//! # Example
//!
//! ```
//! use fastly_setdiff::RecordSet;
//! use serde_json::json;
//!
//! let old: RecordSet = vec![json!({"name": "a"}), json!({"name": "b"})].into();
//! let new: RecordSet = vec![json!({"name": "b"}), json!({"name": "c"})].into();
//!
//! assert_eq!(new.difference(&old).into_vec(), vec![json!({"name": "c"})]);
//! assert_eq!(new.intersection(&old).into_vec(), vec![json!({"name": "b"})]);
//! ```

use std::collections::btree_map::{self, BTreeMap};
use std::fmt::Write;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::SetDiffError;

/// A single nested block instance, normally a JSON object.
pub type Record = Value;

/// An unordered set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    items: BTreeMap<String, Record>,
}

impl RecordSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Returns `false` if an equal record was already present.
    pub fn insert(&mut self, record: Record) -> bool {
        match self.items.entry(canonical(&record)) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            },
        }
    }

    /// Remove a record. Returns `true` if it was present.
    pub fn remove(&mut self, record: &Record) -> bool {
        self.items.remove(&canonical(record)).is_some()
    }

    /// Check whether a structurally equal record is present.
    pub fn contains(&self, record: &Record) -> bool {
        self.items.contains_key(&canonical(record))
    }

    /// Number of distinct records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the records in canonical order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.items.values(),
        }
    }

    /// Records in `self` that are not in `other`.
    pub fn difference(&self, other: &RecordSet) -> RecordSet {
        self.retain_by(|canonical| !other.items.contains_key(canonical))
    }

    /// Records present in both `self` and `other`.
    pub fn intersection(&self, other: &RecordSet) -> RecordSet {
        self.retain_by(|canonical| other.items.contains_key(canonical))
    }

    /// Records present in either set.
    pub fn union(&self, other: &RecordSet) -> RecordSet {
        let mut items = self.items.clone();
        for (canonical, record) in &other.items {
            items
                .entry(canonical.clone())
                .or_insert_with(|| record.clone());
        }
        RecordSet { items }
    }

    /// Consume the set, returning its records in canonical order.
    pub fn into_vec(self) -> Vec<Record> {
        self.items.into_values().collect()
    }

    fn retain_by(&self, keep: impl Fn(&str) -> bool) -> RecordSet {
        let items = self
            .items
            .iter()
            .filter(|(canonical, _)| keep(canonical))
            .map(|(canonical, record)| (canonical.clone(), record.clone()))
            .collect();
        RecordSet { items }
    }
}

/// Canonical text of a record.
///
/// Equal under `Value::eq` if and only if the texts are equal. Integers and
/// floats stay distinct, as they do for `Value::eq`: floats always carry a
/// `.`, an exponent or `inf`.
pub(crate) fn canonical(record: &Record) -> String {
    let mut out = String::new();
    write_canonical(record, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => {
                // -0.0 == 0.0
                let f = if f == 0.0 { 0.0 } else { f };
                let _ = write!(out, "{:?}", f);
            },
            _ => {
                let _ = write!(out, "{}", n);
            },
        },
        Value::String(s) => {
            let _ = write!(out, "{:?}", s);
        },
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        },
        Value::Object(map) => {
            let mut fields: Vec<_> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{:?}:", name);
                write_canonical(field, out);
            }
            out.push('}');
        },
    }
}

/// Borrowing iterator over a [`RecordSet`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: btree_map::Values<'a, String, Record>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = btree_map::IntoValues<String, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut set = RecordSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Record> for RecordSet {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        records.into_iter().collect()
    }
}

impl TryFrom<Value> for RecordSet {
    type Error = SetDiffError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(records) => Ok(records.into()),
            Value::Null => Ok(RecordSet::new()),
            other => Err(SetDiffError::NotACollection(format!(
                "expected array, got {}",
                other
            ))),
        }
    }
}

impl From<RecordSet> for Value {
    fn from(set: RecordSet) -> Self {
        Value::Array(set.into_vec())
    }
}

impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RecordSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<Record>::deserialize(deserializer)?;
        Ok(records.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structural_equality_ignores_field_order() {
        let mut set = RecordSet::new();
        assert!(set.insert(json!({"name": "a", "value": "b"})));

        let reordered: Value =
            serde_json::from_str(r#"{"value": "b", "name": "a"}"#).unwrap();
        assert!(set.contains(&reordered));
        assert!(!set.insert(reordered));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut forward = serde_json::Map::new();
        forward.insert("name".to_string(), json!("a"));
        forward.insert("port".to_string(), json!(1));
        forward.insert("tls".to_string(), json!({"verify": true, "ca": "x"}));

        let mut backward = serde_json::Map::new();
        backward.insert("tls".to_string(), json!({"ca": "x", "verify": true}));
        backward.insert("port".to_string(), json!(1));
        backward.insert("name".to_string(), json!("a"));

        let set: RecordSet = vec![Value::Object(forward)].into();
        assert!(set.contains(&Value::Object(backward)));
    }

    #[test]
    fn test_canonical_sorts_keys_at_every_depth() {
        assert_eq!(
            canonical(&json!({"b": 1, "a": {"d": [1, {"f": 2, "e": 3}], "c": null}})),
            r#"{"a":{"c":null,"d":[1,{"e":3,"f":2}]},"b":1}"#
        );
    }

    #[test]
    fn test_signed_zero_is_one_member() {
        let zero = json!({"name": "a", "weight": 0.0});
        let negative_zero = json!({"name": "a", "weight": -0.0});
        assert_eq!(zero, negative_zero);

        let set: RecordSet = vec![zero].into();
        assert!(set.contains(&negative_zero));
    }

    #[test]
    fn test_integers_and_floats_stay_distinct() {
        assert_ne!(json!(1), json!(1.0));
        let set: RecordSet = vec![json!(1), json!(1.0)].into();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_duplicates_collapse() {
        let set: RecordSet = vec![json!({"name": "a"}), json!({"name": "a"})].into();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_nested_values_compare_deeply() {
        let set: RecordSet = vec![json!({"name": "a", "headers": {"x": [1, 2]}})].into();
        assert!(set.contains(&json!({"headers": {"x": [1, 2]}, "name": "a"})));
        assert!(!set.contains(&json!({"headers": {"x": [2, 1]}, "name": "a"})));
    }

    #[test]
    fn test_set_operations() {
        let a: RecordSet = vec![json!(1), json!(2), json!(3)].into();
        let b: RecordSet = vec![json!(2), json!(3), json!(4)].into();

        assert_eq!(a.difference(&b).into_vec(), vec![json!(1)]);
        assert_eq!(b.difference(&a).into_vec(), vec![json!(4)]);
        assert_eq!(a.intersection(&b).into_vec(), vec![json!(2), json!(3)]);
        assert_eq!(a.union(&b).len(), 4);
    }

    #[test]
    fn test_remove() {
        let mut set: RecordSet = vec![json!({"name": "a"})].into();
        assert!(set.remove(&json!({"name": "a"})));
        assert!(!set.remove(&json!({"name": "a"})));
        assert!(set.is_empty());
    }

    #[test]
    fn test_try_from_value() {
        let set = RecordSet::try_from(json!([{"name": "a"}, {"name": "b"}])).unwrap();
        assert_eq!(set.len(), 2);

        let set = RecordSet::try_from(Value::Null).unwrap();
        assert!(set.is_empty());

        let err = RecordSet::try_from(json!({"name": "a"})).unwrap_err();
        assert!(matches!(err, SetDiffError::NotACollection(_)));
    }

    #[test]
    fn test_serde_as_array() {
        let set: RecordSet = serde_json::from_str(r#"[{"name": "b"}, {"name": "a"}]"#).unwrap();
        assert_eq!(set.len(), 2);

        let text = serde_json::to_string(&set).unwrap();
        assert_eq!(text, r#"[{"name":"a"},{"name":"b"}]"#);
    }
}
