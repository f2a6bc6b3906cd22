//! Value classification: decides which edit control a value gets.
//!
//! The rules are ordered and the first match wins. The order matters for
//! ambiguous inputs, e.g. a long string that is also valid JSON is shown as
//! JSON, not as free text.

use serde::Serialize;
use serde_json::Value;

use crate::form::label::format_label;
use crate::record::path::join;
use crate::record::sanitize::parse_json_text;

/// Strings longer than this many characters get a multi-line text area.
pub const LONG_TEXT_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Null or empty string: blank single-line input.
    Empty,
    Checkbox,
    Number,
    /// String holding a JSON object or array: pretty-printed text area.
    JsonText,
    /// Free text over the length threshold: multi-line text area.
    LongText,
    ShortText,
    /// Array with at least one container element: JSON text area.
    JsonArray,
    /// Array of scalars: comma-joined single line.
    CommaList,
    /// Nested mapping: collapsible section.
    Section,
}

pub fn classify(value: &Value) -> FieldKind {
    match value {
        Value::Null => FieldKind::Empty,
        Value::String(text) if text.is_empty() => FieldKind::Empty,
        Value::Bool(_) => FieldKind::Checkbox,
        Value::Number(_) => FieldKind::Number,
        Value::String(text) => {
            if parse_json_text(text).is_some() {
                FieldKind::JsonText
            } else if text.chars().count() > LONG_TEXT_THRESHOLD {
                FieldKind::LongText
            } else {
                FieldKind::ShortText
            }
        }
        Value::Array(items) if items.iter().any(is_container) => FieldKind::JsonArray,
        Value::Array(_) => FieldKind::CommaList,
        Value::Object(_) => FieldKind::Section,
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// A classified field with its full address and display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedField {
    pub path: String,
    pub label: String,
    pub kind: FieldKind,
}

pub fn classify_field(key: &str, value: &Value, parent_path: &str) -> ClassifiedField {
    ClassifiedField {
        path: join(parent_path, key),
        label: format_label(key),
        kind: classify(value),
    }
}
