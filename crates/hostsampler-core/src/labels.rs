//! Deterministic metric label sets.
//!
//! A label set is an ordered collection of unique `(key, value)` pairs.
//! Keys are kept sorted so two sets built from the same pairs serialize
//! identically no matter the insertion order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sorted, de-duplicated metric dimensions.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Labels {
    pairs: BTreeMap<String, String>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a label set from a common base plus extra dimensions.
    ///
    /// Extra pairs override base pairs with the same key.
    pub fn build<'a>(common: &Labels, extra: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut labels = common.clone();
        for (key, value) in extra {
            labels.insert(key, value);
        }
        labels
    }

    /// Inserts a pair, replacing the value of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.insert(key.into(), value.into());
    }

    /// Returns a copy of this set with one more dimension. `self` is untouched.
    pub fn with(&self, key: &str, value: &str) -> Self {
        Self::build(self, [(key, value)])
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut labels = Labels::new();
        for (key, value) in iter {
            labels.insert(key, value);
        }
        labels
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a: Labels = [("ip", "10.0.0.1"), ("hostname", "web-1"), ("zone", "a")]
            .into_iter()
            .collect();
        let b: Labels = [("zone", "a"), ("hostname", "web-1"), ("ip", "10.0.0.1")]
            .into_iter()
            .collect();

        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.to_string(), "hostname=web-1,ip=10.0.0.1,zone=a");
    }

    #[test]
    fn test_duplicate_key_keeps_last_value() {
        let mut labels = Labels::new();
        labels.insert("hostname", "auto");
        labels.insert("hostname", "override");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("hostname"), Some("override"));
    }

    #[test]
    fn test_with_does_not_mutate_base() {
        let base: Labels = [("hostname", "web-1")].into_iter().collect();
        let sda = base.with("disk", "sda");
        let sdb = base.with("disk", "sdb");

        assert_eq!(base.len(), 1);
        assert_eq!(base.get("disk"), None);
        assert_eq!(sda.to_string(), "disk=sda,hostname=web-1");
        assert_eq!(sdb.to_string(), "disk=sdb,hostname=web-1");
    }

    #[test]
    fn test_build_with_extra_pairs() {
        let base: Labels = [("hostname", "web-1")].into_iter().collect();
        let labels = Labels::build(&base, [("interface", "eth0"), ("hostname", "web-2")]);
        assert_eq!(labels.to_string(), "hostname=web-2,interface=eth0");
        assert_eq!(base.get("hostname"), Some("web-1"));
    }

    #[test]
    fn test_serializes_as_sorted_map() {
        let labels: Labels = [("b", "2"), ("a", "1")].into_iter().collect();
        let json = serde_json::to_string(&labels).unwrap();
        assert_eq!(json, r#"{"a":"1","b":"2"}"#);
    }
}
