//! Turns a (sanitized) record into a tree of form controls.
//!
//! The tree is plain data: the front end draws it, and edits come back as
//! control inputs addressed by path (see `session`).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::form::classify::{classify_field, FieldKind};
use crate::form::work_history::{WorkExperience, WorkHistoryEditor};
use crate::record::path::join;
use crate::record::sanitize::parse_json_text;
use crate::record::{Record, WORK_EXPERIENCES_KEY};

/// Expanded/collapsed flag per section path. Presentation state only; it never
/// feeds back into the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpansionState {
    sections: BTreeMap<String, bool>,
}

impl ExpansionState {
    /// Every mapping-valued path starts expanded.
    pub fn from_record(record: &Record) -> Self {
        let mut sections = BTreeMap::new();
        collect_sections(record, "", &mut sections);
        Self { sections }
    }

    /// Paths never seen before read as expanded.
    pub fn is_expanded(&self, path: &str) -> bool {
        self.sections.get(path).copied().unwrap_or(true)
    }

    /// Flips the flag for `path` and returns the new value.
    pub fn toggle(&mut self, path: &str) -> bool {
        let expanded = !self.is_expanded(path);
        self.sections.insert(path.to_string(), expanded);
        expanded
    }
}

fn collect_sections(map: &Record, parent: &str, sections: &mut BTreeMap<String, bool>) {
    for (key, value) in map {
        if let Value::Object(nested) = value {
            let path = join(parent, key);
            collect_sections(nested, &path, sections);
            sections.insert(path, true);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlValue {
    Text(String),
    Checked(bool),
    Number(Number),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldControl {
    pub path: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: ControlValue,
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum FormNode {
    Field(FieldControl),
    Section {
        path: String,
        label: String,
        expanded: bool,
        /// Empty while collapsed.
        children: Vec<FormNode>,
    },
    WorkHistory {
        path: String,
        label: String,
        entries: Vec<WorkExperience>,
    },
}

impl FormNode {
    pub fn path(&self) -> &str {
        match self {
            FormNode::Field(control) => &control.path,
            FormNode::Section { path, .. } | FormNode::WorkHistory { path, .. } => path,
        }
    }
}

/// Renders every top-level entry in record order.
pub fn render_record(record: &Record, expansion: &ExpansionState) -> Vec<FormNode> {
    record
        .iter()
        .map(|(key, value)| {
            if key == WORK_EXPERIENCES_KEY && value.is_array() {
                let editor = WorkHistoryEditor::from_value(Some(value));
                FormNode::WorkHistory {
                    path: key.clone(),
                    label: "Work Experience".to_string(),
                    entries: editor.entries(),
                }
            } else {
                render_field(key, value, "", expansion)
            }
        })
        .collect()
}

pub fn render_field(key: &str, value: &Value, parent: &str, expansion: &ExpansionState) -> FormNode {
    let field = classify_field(key, value, parent);
    let lowered = field.label.to_lowercase();

    let (control_value, placeholder, hint) = match field.kind {
        FieldKind::Section => {
            let expanded = expansion.is_expanded(&field.path);
            let children = match value {
                Value::Object(map) if expanded => map
                    .iter()
                    .map(|(nested_key, nested)| render_field(nested_key, nested, &field.path, expansion))
                    .collect(),
                _ => Vec::new(),
            };
            return FormNode::Section {
                path: field.path,
                label: field.label,
                expanded,
                children,
            };
        }
        FieldKind::Empty => (ControlValue::Text(String::new()), format!("Enter {lowered}"), None),
        FieldKind::Checkbox => (
            ControlValue::Checked(value.as_bool().unwrap_or_default()),
            format!("Enter {lowered}"),
            None,
        ),
        FieldKind::Number => (
            match value {
                Value::Number(n) => ControlValue::Number(n.clone()),
                _ => ControlValue::Text(String::new()),
            },
            format!("Enter {lowered}"),
            None,
        ),
        FieldKind::JsonText => {
            let text = value.as_str().unwrap_or_default();
            let pretty = parse_json_text(text)
                .map(|parsed| pretty_json(&parsed))
                .unwrap_or_else(|| text.to_string());
            (
                ControlValue::Text(pretty),
                format!("Enter valid JSON for {lowered}"),
                Some("Enter valid JSON object"),
            )
        }
        FieldKind::LongText | FieldKind::ShortText => (
            ControlValue::Text(value.as_str().unwrap_or_default().to_string()),
            format!("Enter {lowered}"),
            None,
        ),
        FieldKind::JsonArray => (
            ControlValue::Text(pretty_json(value)),
            format!("Enter JSON array for {lowered}"),
            Some("Enter valid JSON array"),
        ),
        FieldKind::CommaList => (
            ControlValue::Text(comma_join(value)),
            format!("Enter {lowered} (comma separated)"),
            Some("Separate items with commas"),
        ),
    };

    let rows = match field.kind {
        FieldKind::JsonText | FieldKind::JsonArray => Some(5),
        FieldKind::LongText | FieldKind::CommaList => Some(3),
        _ => None,
    };

    FormNode::Field(FieldControl {
        path: field.path,
        label: field.label,
        kind: field.kind,
        value: control_value,
        placeholder,
        hint,
        rows,
    })
}

pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn comma_join(value: &Value) -> String {
    let Value::Array(items) = value else {
        return String::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
