use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use itertools::Itertools;

use crate::collector::Collector;
use crate::error::{Error, Reason};
use crate::Result;

type InspectFn = dyn Fn(&str) -> Result<Collector> + Send + Sync;

/// Parses one argument tag's raw text into a typed [Collector].
#[derive(Clone)]
pub struct Inspector {
    tag: String,
    f: Arc<InspectFn>,
}

impl Inspector {
    pub fn create(&self, raw: &str) -> Result<Collector> {
        (self.f)(raw)
    }

    pub fn keyword(&self) -> &str {
        &self.tag
    }
}

/// Thread-safe registry mapping argument tags to inspectors. Lookups clone
/// the inspector out so they never hold the lock while it runs.
#[derive(Default)]
pub struct InspectorSet {
    inner: RwLock<HashMap<String, Inspector>>,
}

impl InspectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an inspector for `tag`, replacing any existing one.
    pub fn register(
        &self,
        tag: impl Into<String>,
        f: impl Fn(&str) -> Result<Collector> + Send + Sync + 'static,
    ) {
        let tag = tag.into();
        let inspector = Inspector {
            tag: tag.clone(),
            f: Arc::new(f),
        };
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.insert(tag, inspector);
    }

    pub fn deregister(&self, tag: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.remove(tag);
    }

    pub fn has(&self, tag: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.contains_key(tag)
    }

    pub fn get(&self, tag: &str) -> Option<Inspector> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.get(tag).cloned()
    }
}

/// The process-wide inspector registry, pre-loaded with the built-in tags.
/// Additional inspectors may be registered at any point, though callers are
/// expected to do so before running queries.
pub fn default_inspectors() -> &'static InspectorSet {
    static DEFAULT: OnceLock<InspectorSet> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        let set = InspectorSet::new();
        add_default_inspections(&set);
        set
    })
}

/// Registers the built-in argument tags onto `set`.
pub fn add_default_inspections(set: &InspectorSet) {
    for tag in ["gt", "gte", "lt", "lte"] {
        set.register(tag, move |data| {
            let mut cond = Collector::of_kind(tag);
            cond.set("value", parse_int(tag, data)?);
            Ok(cond)
        });
    }

    set.register("id", |data| {
        // ids stay strings downstream, but must read as integers
        let num = parse_int("id", data)?;
        let mut cond = Collector::of_kind("is");
        cond.set("value", num.to_string());
        Ok(cond)
    });

    set.register("in", |data| {
        let mut cond = Collector::of_kind("in");
        cond.set("range", split_bracket_list(data));
        Ok(cond)
    });

    set.register("with", |data| {
        let mut cond = Collector::of_kind("with");
        cond.set("value", split_bracket_list(data));
        Ok(cond)
    });

    set.register("is", |data| {
        let mut cond = Collector::of_kind("is");
        cond.set("value", data.trim());
        Ok(cond)
    });

    set.register("isnot", |data| {
        let mut cond = Collector::of_kind("isnot");
        cond.set("value", data.trim());
        Ok(cond)
    });

    set.register("range", |data| {
        let props = data.split("..").collect_vec();
        if props.len() != 2 {
            return Err(Error::argument(format!(
                "invalid value `{}`, expected the pattern `min..max`",
                data.trim()
            )));
        }
        let min = parse_int("range", props[0])?;
        let max = parse_int("range", props[1])?;
        let mut cond = Collector::of_kind("range");
        cond.set("max", max);
        cond.set("min", min);
        Ok(cond)
    });
}

fn parse_int(tag: &'static str, data: &str) -> Result<i64> {
    data.trim().parse::<i64>().map_err(|_| {
        Error::new(Reason::Numeric {
            tag: tag.to_string(),
            found: data.trim().to_string(),
        })
    })
}

/// Strips one surrounding `[` `]` pair and splits on single spaces. Doubled
/// spaces yield empty elements; the relation operator rejects those.
fn split_bracket_list(data: &str) -> Vec<String> {
    let val = data.trim();
    let val = val.strip_prefix('[').unwrap_or(val);
    let val = val.strip_suffix(']').unwrap_or(val);
    val.split(' ').map(String::from).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn create(tag: &str, raw: &str) -> Result<Collector> {
        default_inspectors().get(tag).unwrap().create(raw)
    }

    #[test]
    fn test_numeric_inspectors() {
        for tag in ["gt", "gte", "lt", "lte"] {
            let col = create(tag, " 30 ").unwrap();
            assert_eq!(col.kind(), tag);
            assert_eq!(col.get("value").unwrap().as_i64(), Some(30));
        }

        let err = create("gt", "abc").unwrap_err();
        assert_eq!(err.code(), "E0004");
    }

    #[test]
    fn test_id_restringifies() {
        let col = create("id", " 4").unwrap();
        assert_eq!(col.kind(), "is");
        assert_eq!(col.get("value").unwrap().as_str(), Some("4"));

        assert!(create("id", "four").is_err());
    }

    #[test]
    fn test_is_and_isnot_keep_text() {
        let col = create("is", " wednesday ").unwrap();
        assert_eq!(col.get("value").unwrap().as_str(), Some("wednesday"));

        let col = create("isnot", "wednesday").unwrap();
        assert_eq!(col.kind(), "isnot");
        assert_eq!(col.get("value").unwrap().as_str(), Some("wednesday"));
    }

    #[test]
    fn test_in_and_with_split_on_spaces() {
        let col = create("in", " [mon tue wed]").unwrap();
        assert_eq!(
            col.get("range").unwrap(),
            &serde_json::json!(["mon", "tue", "wed"])
        );

        let col = create("with", "[user_id id]").unwrap();
        assert_eq!(
            col.get("value").unwrap(),
            &serde_json::json!(["user_id", "id"])
        );

        // doubled spaces leave an empty element in place
        let col = create("with", "[user_id  id]").unwrap();
        assert_eq!(
            col.get("value").unwrap(),
            &serde_json::json!(["user_id", "", "id"])
        );
    }

    #[test]
    fn test_range_bounds() {
        let col = create("range", "18..30").unwrap();
        assert_eq!(col.kind(), "range");
        assert_eq!(col.get("min").unwrap().as_i64(), Some(18));
        assert_eq!(col.get("max").unwrap().as_i64(), Some(30));

        assert_eq!(create("range", "18").unwrap_err().code(), "E0003");
        assert_eq!(create("range", "18..30..40").unwrap_err().code(), "E0003");
        assert_eq!(create("range", "a..30").unwrap_err().code(), "E0004");
    }

    #[test]
    fn test_register_and_deregister() {
        let set = InspectorSet::new();
        assert!(!set.has("custom"));
        set.register("custom", |data| {
            let mut cond = Collector::of_kind("custom");
            cond.set("value", data.trim());
            Ok(cond)
        });
        assert!(set.has("custom"));
        assert_eq!(set.get("custom").unwrap().keyword(), "custom");
        set.deregister("custom");
        assert!(set.get("custom").is_none());
    }
}
