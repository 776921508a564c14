//! Operator registries: functions turning a typed collector into SQL
//! fragments with alias placeholders, resolved per table by the query
//! generator.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use itertools::Itertools;
use serde_json::Value;

use nestql_parser::{Collector, Error, Reason};

use crate::Result;

/// Placeholder for the owning node's table alias.
pub const TABLE: &str = "{{table}}";
/// Placeholder for the parent node's table alias.
pub const PARENT_TABLE: &str = "{{parentTable}}";

/// Rule tags resolved through the relation registry and stripped from the
/// node's rules before ordinary operator dispatch.
pub(crate) const RELATION_KEYS: &[&str] = &["with"];

type OperatorFn = dyn Fn(&str, &Collector) -> Result<Vec<String>> + Send + Sync;

/// Emits SQL fragments for one collector kind.
#[derive(Clone)]
pub struct Operator {
    tag: String,
    f: Arc<OperatorFn>,
}

impl Operator {
    pub fn apply(&self, field: &str, collector: &Collector) -> Result<Vec<String>> {
        (self.f)(field, collector)
    }

    pub fn keyword(&self) -> &str {
        &self.tag
    }
}

/// Thread-safe registry mapping collector kinds to fragment emitters.
#[derive(Default)]
pub struct OperatorSet {
    inner: RwLock<HashMap<String, Operator>>,
}

impl OperatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operator for `tag`. An existing registration wins.
    pub fn add(
        &self,
        tag: impl Into<String>,
        f: impl Fn(&str, &Collector) -> Result<Vec<String>> + Send + Sync + 'static,
    ) {
        let tag = tag.into();
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.entry(tag.clone()).or_insert(Operator {
            tag,
            f: Arc::new(f),
        });
    }

    pub fn remove(&self, tag: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.remove(tag);
    }

    pub fn has(&self, tag: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.contains_key(tag)
    }

    pub fn get(&self, tag: &str) -> Option<Operator> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.get(tag).cloned()
    }

    /// Runs the operator registered for `tag` against one collector.
    pub fn process(&self, tag: &str, field: &str, collector: &Collector) -> Result<Vec<String>> {
        let op = self.get(tag).ok_or_else(|| {
            Error::new(Reason::OperatorMissing {
                kind: tag.to_string(),
            })
        })?;
        op.apply(field, collector)
    }
}

/// The process-wide registry for condition fragments, keyed by collector
/// kind.
pub fn default_operators() -> &'static OperatorSet {
    static DEFAULT: OnceLock<OperatorSet> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        let set = OperatorSet::new();
        add_sql_operators(&set);
        set
    })
}

/// The process-wide registry for relation tags (`with`).
pub fn default_relation_operators() -> &'static OperatorSet {
    static DEFAULT: OnceLock<OperatorSet> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        let set = OperatorSet::new();
        add_sql_relation_operators(&set);
        set
    })
}

/// Registers the built-in condition operators onto `set`.
pub fn add_sql_operators(set: &OperatorSet) {
    set.add("id", |name, c| {
        let val = scalar_text(require(c, "value", "id")?);
        Ok(vec![format!("{TABLE}.{name} = {val}")])
    });

    set.add("is", |name, c| {
        let val = scalar_text(require(c, "value", "is")?);
        Ok(vec![format!("{TABLE}.{name} = {val}")])
    });

    set.add("isnot", |name, c| {
        let val = scalar_text(require(c, "value", "isnot")?);
        Ok(vec![format!("{TABLE}.{name} != {val}")])
    });

    set.add("gte", |name, c| {
        let val = require_int(c, "value", "gte")?;
        Ok(vec![format!("{TABLE}.{name} => {val}")])
    });

    set.add("gt", |name, c| {
        let val = require_int(c, "value", "gt")?;
        Ok(vec![format!("{TABLE}.{name} > {val}")])
    });

    set.add("lte", |name, c| {
        let val = require_int(c, "value", "lte")?;
        Ok(vec![format!("{TABLE}.{name} <= {val}")])
    });

    set.add("lt", |name, c| {
        let val = require_int(c, "value", "lt")?;
        Ok(vec![format!("{TABLE}.{name} < {val}")])
    });

    set.add("in", |name, c| {
        let options = require_list(c, "range", "in")?;
        let words = options
            .iter()
            .map(|v| format!("{TABLE}.{name} = {}", scalar_text(v)))
            .join("\nOR ");
        Ok(vec![words])
    });

    set.add("range", |name, c| {
        let max = require_int(c, "max", "range")?;
        let min = require_int(c, "min", "range")?;
        // TODO: `=>` is not a SQL comparator and the bounds read crossed;
        // changing either alters every emitted statement, so fix them
        // together with downstream consumers.
        Ok(vec![
            format!("{TABLE}.{name} => {max}"),
            format!("{TABLE}.{name} <= {min}"),
        ])
    });
}

/// Registers the built-in relation operators onto `set`.
pub fn add_sql_relation_operators(set: &OperatorSet) {
    set.add("with", |_name, c| {
        let pair = require_list(c, "value", "with")?;
        // the inspector splits on single spaces, so doubled spaces leave
        // empty elements behind
        let (child, parent) = match (pair.first(), pair.get(1)) {
            (Some(child), Some(parent)) => (scalar_text(child), scalar_text(parent)),
            _ => (String::new(), String::new()),
        };
        if child.is_empty() || parent.is_empty() {
            return Err(Error::new(Reason::RelationPair {
                found: format!("[{}]", pair.iter().map(scalar_text).join(" ")),
            }));
        }
        Ok(vec![format!("{TABLE}.{child} = {PARENT_TABLE}.{parent}")])
    });
}

/// Renders a collector entry the way it reads in the query text: strings
/// bare, everything else as its literal.
fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn require<'a>(c: &'a Collector, key: &str, tag: &str) -> Result<&'a Value> {
    c.get(key)
        .ok_or_else(|| Error::argument(format!("collector for `{tag}` has no `{key}`")))
}

fn require_int(c: &Collector, key: &str, tag: &str) -> Result<i64> {
    require(c, key, tag)?
        .as_i64()
        .ok_or_else(|| Error::argument(format!("collector for `{tag}` has a non-integer `{key}`")))
}

fn require_list<'a>(c: &'a Collector, key: &str, tag: &str) -> Result<&'a Vec<Value>> {
    require(c, key, tag)?
        .as_array()
        .ok_or_else(|| Error::argument(format!("collector for `{tag}` has a non-list `{key}`")))
}
