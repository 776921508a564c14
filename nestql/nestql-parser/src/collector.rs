use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

/// A keyed bag describing one argument's semantics. Every collector carries a
/// kind (serialized as the `type` key) naming how its entries are to be
/// interpreted, e.g. `is`, `range`, `in`, `with`.
#[derive(Debug, Clone, PartialEq)]
pub struct Collector {
    kind: String,
    entries: IndexMap<String, Value>,
}

impl Collector {
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Collector {
            kind: kind.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Collector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        map.serialize_entry("type", &self.kind)?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Lists of collectors keyed by tag or field name, in declaration order.
/// Re-using a key appends, so repeated argument clauses accumulate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectorMap(IndexMap<String, Vec<Collector>>);

impl CollectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, collector: Collector) {
        self.0.entry(key.into()).or_default().push(collector);
    }

    pub fn extend(&mut self, key: impl Into<String>, collectors: Vec<Collector>) {
        self.0.entry(key.into()).or_default().extend(collectors);
    }

    /// Records a key with no collectors, e.g. a scalar field without
    /// arguments.
    pub fn ensure(&mut self, key: impl Into<String>) {
        self.0.entry(key.into()).or_default();
    }

    pub fn get(&self, key: &str) -> Option<&[Collector]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Collector>> {
        self.0.shift_remove(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Collector])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Flattens every (key, collector) pair in declaration order.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Collector)> {
        self.0
            .iter()
            .flat_map(|(k, v)| v.iter().map(move |c| (k.as_str(), c)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
