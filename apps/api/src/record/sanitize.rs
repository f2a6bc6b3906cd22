//! Forward and inverse normalization of LLM-shaped records.
//!
//! `sanitize` makes every leaf renderable as editable text before a form is
//! built; `reconstitute` undoes the JSON-text encoding at submit time wherever
//! the (possibly edited) text still parses.

use serde_json::Value;

use super::Record;

/// Forward pass: null becomes `""`, container elements of arrays become their
/// compact JSON text, everything else recurses or passes through.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(_) | Value::Array(_) => Value::String(item.to_string()),
                    other => sanitize(other),
                })
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), sanitize(v)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// Inverse pass: JSON-looking strings that parse are replaced by the parsed
/// structure; strings that do not parse are kept verbatim.
pub fn reconstitute(value: &Value) -> Value {
    match value {
        Value::String(text) => parse_json_text(text).unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(reconstitute).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), reconstitute(v)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// `sanitize` applied to every top-level value.
pub fn sanitize_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| (key.clone(), sanitize(value)))
        .collect()
}

/// `reconstitute` applied to every top-level value.
pub fn reconstitute_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| (key.clone(), reconstitute(value)))
        .collect()
}

/// True when the trimmed text is delimited like a JSON object or array.
pub fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

/// Strictly parses JSON-shaped text; `None` when it is not shaped like JSON or
/// fails to parse.
pub fn parse_json_text(text: &str) -> Option<Value> {
    if !looks_like_json(text) {
        return None;
    }
    serde_json::from_str(text.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_null_becomes_empty_string() {
        let input = json!({"name": "Jane Doe", "skills": null, "workExperiences": []});
        assert_eq!(
            sanitize(&input),
            json!({"name": "Jane Doe", "skills": "", "workExperiences": []})
        );
    }

    #[test]
    fn test_sanitize_stringifies_container_array_elements() {
        let input = json!({"projects": [{"title": "Compiler"}, "side gig", [1, 2]]});
        assert_eq!(
            sanitize(&input),
            json!({"projects": ["{\"title\":\"Compiler\"}", "side gig", "[1,2]"]})
        );
    }

    #[test]
    fn test_sanitize_keeps_scalars_and_key_order() {
        let input = json!({"b": 1, "a": true, "c": {"z": null, "y": 2.5}});
        let out = sanitize(&input);
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(out["c"], json!({"z": "", "y": 2.5}));
    }

    #[test]
    fn test_sanitize_null_array_element() {
        assert_eq!(sanitize(&json!(["a", null])), json!(["a", ""]));
    }

    #[test]
    fn test_reconstitute_parses_json_strings() {
        let input = json!({"projects": ["{\"title\":\"Compiler\"}", "plain"], "meta": " [1, 2] "});
        assert_eq!(
            reconstitute(&input),
            json!({"projects": [{"title": "Compiler"}, "plain"], "meta": [1, 2]})
        );
    }

    #[test]
    fn test_reconstitute_keeps_malformed_json() {
        let input = json!({"scores": "[1, 2,", "note": "{not json}"});
        assert_eq!(reconstitute(&input), input);
    }

    #[test]
    fn test_round_trip_restores_container_elements() {
        let original = json!({
            "name": "Jane",
            "yoe": 4,
            "remote": false,
            "projects": [{"title": "Compiler", "tags": ["rust"]}, "misc"]
        });
        assert_eq!(reconstitute(&sanitize(&original)), original);
    }

    #[test]
    fn test_round_trip_tolerates_malformed_string() {
        let original = json!({"draft": "{\"unterminated\": "});
        assert_eq!(reconstitute(&sanitize(&original)), original);
    }

    #[test]
    fn test_record_passes_match_value_passes() {
        let original = json!({"skills": null, "projects": [{"title": "Compiler"}]});
        let record = original.as_object().cloned().unwrap();
        let sanitized = sanitize_record(&record);
        assert_eq!(Value::Object(sanitized.clone()), sanitize(&original));
        assert_eq!(
            Value::Object(reconstitute_record(&sanitized)),
            json!({"skills": "", "projects": [{"title": "Compiler"}]})
        );
    }

    #[test]
    fn test_looks_like_json() {
        assert!(looks_like_json("{}"));
        assert!(looks_like_json("  [1]  "));
        assert!(!looks_like_json("{ half"));
        assert!(!looks_like_json("plain text"));
    }
}
