//! Path-addressed access into a nested record.
//!
//! Paths are dotted (`contact.address.city`). Writes are copy-on-write: the
//! input record is never touched, so readers holding the previous snapshot keep
//! a consistent view.

use serde_json::{Map, Value};

use super::Record;

/// Returns a new record with `path` set to `value`.
///
/// Every segment but the last names an intermediate mapping; missing or
/// non-mapping intermediates are replaced by empty mappings.
pub fn set_path(record: &Record, path: &str, value: Value) -> Record {
    let mut updated = record.clone();
    let segments: Vec<&str> = path.split('.').collect();
    let (leaf, parents) = match segments.split_last() {
        Some(split) => split,
        None => return updated,
    };

    let mut current = &mut updated;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => unreachable!("slot was just made an object"),
        };
    }

    current.insert(leaf.to_string(), value);
    updated
}

/// Reads the value at `path`, if every segment resolves through mappings.
pub fn get_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// The first proper prefix of `path` that holds an array, if any. Writes
/// through such a prefix would replace the whole array with a mapping.
pub fn array_prefix(record: &Record, path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('.').collect();
    (1..segments.len())
        .map(|n| segments[..n].join("."))
        .find(|prefix| matches!(get_path(record, prefix), Some(Value::Array(_))))
}

/// Joins a parent path and a key the way the form addresses fields.
pub fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_set_top_level_field() {
        let original = record(json!({"name": "Jane", "yoe": "3"}));
        let updated = set_path(&original, "name", json!("Jane Doe"));
        assert_eq!(updated["name"], json!("Jane Doe"));
        assert_eq!(updated["yoe"], json!("3"));
        assert_eq!(original["name"], json!("Jane"));
    }

    #[test]
    fn test_set_creates_intermediate_mappings() {
        let original = record(json!({"name": "Jane"}));
        let updated = set_path(&original, "contact.address.city", json!("Oslo"));
        assert_eq!(
            updated["contact"],
            json!({"address": {"city": "Oslo"}})
        );
        assert!(original.get("contact").is_none());
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let original = record(json!({"contact": "jane@example.com"}));
        let updated = set_path(&original, "contact.email", json!("jane@example.com"));
        assert_eq!(updated["contact"], json!({"email": "jane@example.com"}));
    }

    #[test]
    fn test_set_keeps_siblings_in_nested_mapping() {
        let original = record(json!({"contact": {"email": "a@b.c", "phone": "123"}}));
        let updated = set_path(&original, "contact.phone", json!("456"));
        assert_eq!(updated["contact"], json!({"email": "a@b.c", "phone": "456"}));
    }

    #[test]
    fn test_get_path_nested() {
        let r = record(json!({"contact": {"address": {"city": "Oslo"}}}));
        assert_eq!(get_path(&r, "contact.address.city"), Some(&json!("Oslo")));
        assert_eq!(get_path(&r, "contact.missing"), None);
        assert_eq!(get_path(&r, "contact.address.city.deeper"), None);
    }

    #[test]
    fn test_array_prefix_finds_array_ancestor() {
        let r = record(json!({
            "workExperiences": [{"jobTitle": "Eng"}],
            "contact": {"links": ["a"], "email": "x"}
        }));
        assert_eq!(array_prefix(&r, "workExperiences.0.jobTitle"), Some("workExperiences".to_string()));
        assert_eq!(array_prefix(&r, "contact.links.0"), Some("contact.links".to_string()));
        assert_eq!(array_prefix(&r, "contact.links"), None);
        assert_eq!(array_prefix(&r, "contact.email"), None);
        assert_eq!(array_prefix(&r, "missing.deeper"), None);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "name"), "name");
        assert_eq!(join("contact", "email"), "contact.email");
    }

    fn leaves(value: &Value, prefix: Vec<String>, out: &mut Vec<(Vec<String>, Value)>) {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (k, v) in map {
                    let mut path = prefix.clone();
                    path.push(k.clone());
                    leaves(v, path, out);
                }
            }
            other => out.push((prefix, other.clone())),
        }
    }

    fn related(a: &[String], b: &[String]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| x == y)
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z ]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::vec(("[a-c]", inner), 0..4)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect()))
        })
    }

    proptest! {
        #[test]
        fn prop_set_path_is_targeted(
            pairs in prop::collection::vec(("[a-c]", arb_value()), 0..4),
            segments in prop::collection::vec("[a-d]", 1..4),
            new_value in "[a-z]{0,6}",
        ) {
            let original: Record = pairs.into_iter().collect();
            let before = original.clone();
            let path = segments.join(".");
            let value = Value::String(new_value);

            let updated = set_path(&original, &path, value.clone());

            prop_assert_eq!(&original, &before);
            prop_assert_eq!(get_path(&updated, &path), Some(&value));

            let mut untouched = Vec::new();
            leaves(&Value::Object(original), Vec::new(), &mut untouched);
            for (leaf_path, leaf_value) in untouched {
                if leaf_path.is_empty() || related(&leaf_path, &segments) {
                    continue;
                }
                prop_assert_eq!(get_path(&updated, &leaf_path.join(".")), Some(&leaf_value));
            }
        }
    }
}
