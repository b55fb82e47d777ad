use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Int(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(text) => f.write_str(text),
            ParamValue::Int(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(ParamValue::Int)
            .unwrap_or_else(|_| ParamValue::Text(value.to_string()))
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

/// Key-value store backing both query parameters and headers.
///
/// Keys are unique; ordering is by key so rendered requests are stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyValueStore<V> {
    entries: BTreeMap<String, V>,
}

pub type ParamStore = KeyValueStore<ParamValue>;
pub type HeaderStore = KeyValueStore<String>;

impl<V> Default for KeyValueStore<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> KeyValueStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Returns the previous value, if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<V>) -> Option<V> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key)
    }

    /// Upserts every entry in order; a repeated key keeps its last value.
    pub fn set_many<K, I, T>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<V>,
    {
        for (key, value) in entries {
            self.entries.insert(key.into(), value.into());
        }
    }

    /// Absent keys are skipped. Returns how many keys were actually removed.
    pub fn delete_many<K, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .filter(|key| self.entries.remove(key.as_ref()).is_some())
            .count()
    }

    /// Removes every key not named in `exemptions`. Returns the removed keys.
    pub fn clear_all(&mut self, exemptions: &BTreeSet<String>) -> Vec<String> {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| !exemptions.contains(key.as_str()))
            .cloned()
            .collect();
        for key in &doomed {
            self.entries.remove(key);
        }
        doomed
    }
}

impl<V: fmt::Display> KeyValueStore<V> {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}
