//! Work-history list editor.
//!
//! The work-history sequence gets a dedicated editor instead of the generic
//! JSON text area: entries can be appended, removed and edited field by field,
//! and the list is never allowed to become empty. Keys the editor does not know
//! and entries that are not objects ride along untouched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::record::sanitize::parse_json_text;
use crate::record::{Record, WORK_EXPERIENCES_KEY};

#[derive(Debug, Error, PartialEq)]
pub enum WorkHistoryError {
    #[error("work experience {0} not found")]
    NotFound(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    /// Only used to tell entries apart while editing.
    pub id: String,
    pub employer: String,
    pub job_title: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
    /// Every other key of the entry, in its original order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkExperience {
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            employer: String::new(),
            job_title: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            current: false,
            description: String::new(),
            extra: Map::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), Value::String(self.id.clone()));
        obj.insert("employer".into(), Value::String(self.employer.clone()));
        obj.insert("jobTitle".into(), Value::String(self.job_title.clone()));
        obj.insert("startDate".into(), Value::String(self.start_date.clone()));
        obj.insert("endDate".into(), Value::String(self.end_date.clone()));
        obj.insert("current".into(), Value::Bool(self.current));
        obj.insert("description".into(), Value::String(self.description.clone()));
        for (key, value) in &self.extra {
            obj.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(obj)
    }

    /// Lenient read of one LLM-produced entry. Accepts an object or its JSON
    /// text, numeric or string ids, and `"true"`-style booleans. Keys that are
    /// not editable fields are kept in `extra`.
    fn from_value(value: &Value) -> Option<Self> {
        let owned = match value {
            Value::String(text) => parse_json_text(text)?,
            other => other.clone(),
        };
        let Value::Object(mut rest) = owned else {
            return None;
        };

        let id = match rest.remove("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        let current = match rest.remove("current") {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => parse_flag(&s).unwrap_or(false),
            _ => false,
        };
        let mut entry = Self {
            id,
            employer: take_text(&mut rest, &["employer", "company"]),
            job_title: take_text(&mut rest, &["jobTitle", "title"]),
            start_date: take_text(&mut rest, &["startDate"]),
            end_date: take_text(&mut rest, &["endDate"]),
            current,
            description: take_text(&mut rest, &["description"]),
            extra: rest,
        };
        if entry.current {
            entry.end_date.clear();
        }
        Some(entry)
    }
}

/// Takes the first of `keys` present in `obj` as text. Null reads as empty;
/// structured values become their JSON text so submit can restore them.
fn take_text(obj: &mut Map<String, Value>, keys: &[&str]) -> String {
    let Some(key) = keys.iter().find(|key| obj.contains_key(**key)) else {
        return String::new();
    };
    match obj.remove(*key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Editable field of a work-history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkField {
    Employer,
    JobTitle,
    StartDate,
    EndDate,
    Current,
    Description,
}

impl WorkField {
    fn name(self) -> &'static str {
        match self {
            WorkField::Employer => "employer",
            WorkField::JobTitle => "jobTitle",
            WorkField::StartDate => "startDate",
            WorkField::EndDate => "endDate",
            WorkField::Current => "current",
            WorkField::Description => "description",
        }
    }
}

/// One position in the sequence.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Entry(WorkExperience),
    /// Not an object; kept as found and never edited.
    Opaque(Value),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkHistoryEditor {
    slots: Vec<Slot>,
}

impl WorkHistoryEditor {
    /// Reads the sequence as found in a record. Anything that is not an array
    /// yields an empty list.
    pub fn from_value(value: Option<&Value>) -> Self {
        let items = match value {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };

        let mut seen = HashSet::new();
        let mut slots = Vec::with_capacity(items.len());
        for item in items {
            let Some(mut entry) = WorkExperience::from_value(item) else {
                debug!("Keeping non-object work-history entry as is: {item}");
                slots.push(Slot::Opaque(item.clone()));
                continue;
            };
            if !seen.insert(entry.id.clone()) {
                entry.id = Uuid::new_v4().to_string();
                seen.insert(entry.id.clone());
            }
            slots.push(Slot::Entry(entry));
        }
        Self { slots }
    }

    pub fn from_record(record: &Record) -> Self {
        Self::from_value(record.get(WORK_EXPERIENCES_KEY))
    }

    /// The editable entries, in sequence order.
    pub fn entries(&self) -> Vec<WorkExperience> {
        self.entries_iter().cloned().collect()
    }

    fn entries_iter(&self) -> impl Iterator<Item = &WorkExperience> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Entry(entry) => Some(entry),
            Slot::Opaque(_) => None,
        })
    }

    /// Adds one blank entry if there is no editable entry. Returns whether it did.
    pub fn ensure_entry(&mut self) -> bool {
        if self.entries_iter().next().is_none() {
            self.slots.push(Slot::Entry(WorkExperience::blank()));
            true
        } else {
            false
        }
    }

    /// Appends a blank entry and returns its id.
    pub fn add(&mut self) -> String {
        let entry = WorkExperience::blank();
        let id = entry.id.clone();
        self.slots.push(Slot::Entry(entry));
        debug!(id = %id, "Added work-history entry");
        id
    }

    /// Removes the entry with `id`. Refused (returns false) when it is the last
    /// remaining entry or the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.entries_iter().count() <= 1 {
            return false;
        }
        let before = self.slots.len();
        self.slots
            .retain(|slot| !matches!(slot, Slot::Entry(entry) if entry.id == id));
        before != self.slots.len()
    }

    /// Sets one field. Setting `current` to true clears the end date.
    pub fn update(
        &mut self,
        id: &str,
        field: WorkField,
        value: &Value,
    ) -> Result<&WorkExperience, WorkHistoryError> {
        let entry = self
            .slots
            .iter_mut()
            .find_map(|slot| match slot {
                Slot::Entry(entry) if entry.id == id => Some(entry),
                _ => None,
            })
            .ok_or_else(|| WorkHistoryError::NotFound(id.to_string()))?;

        match field {
            WorkField::Current => {
                let flag = match value {
                    Value::Bool(b) => Some(*b),
                    Value::String(s) => parse_flag(s),
                    _ => None,
                }
                .ok_or_else(|| WorkHistoryError::InvalidValue {
                    field: field.name(),
                    reason: format!("expected a boolean, got {value}"),
                })?;
                entry.current = flag;
                if flag {
                    entry.end_date.clear();
                }
            }
            other => {
                let text = value
                    .as_str()
                    .ok_or_else(|| WorkHistoryError::InvalidValue {
                        field: other.name(),
                        reason: format!("expected a string, got {value}"),
                    })?
                    .to_string();
                match other {
                    WorkField::Employer => entry.employer = text,
                    WorkField::JobTitle => entry.job_title = text,
                    WorkField::StartDate => entry.start_date = text,
                    WorkField::EndDate if entry.current => {}
                    WorkField::EndDate => entry.end_date = text,
                    WorkField::Description => entry.description = text,
                    WorkField::Current => unreachable!("handled above"),
                }
            }
        }
        Ok(entry)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(
            self.slots
                .iter()
                .map(|slot| match slot {
                    Slot::Entry(entry) => entry.to_value(),
                    Slot::Opaque(value) => value.clone(),
                })
                .collect(),
        )
    }

    /// The partial record that republishes the whole sequence.
    pub fn publish(&self) -> Record {
        let mut partial = Record::new();
        partial.insert(WORK_EXPERIENCES_KEY.to_string(), self.to_value());
        partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn editor_with(value: Value) -> WorkHistoryEditor {
        WorkHistoryEditor::from_value(Some(&value))
    }

    #[test]
    fn test_empty_sequence_initializes_one_blank_entry() {
        let mut editor = editor_with(json!([]));
        assert!(editor.ensure_entry());
        let entries = editor.entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(!entry.id.is_empty());
        assert_eq!(entry.employer, "");
        assert!(!entry.current);
        assert!(!editor.ensure_entry());
    }

    #[test]
    fn test_missing_or_scalar_sequence_reads_as_empty() {
        assert!(WorkHistoryEditor::from_value(None).entries().is_empty());
        assert!(editor_with(json!("")).entries().is_empty());
    }

    #[test]
    fn test_reads_llm_shaped_entries() {
        let editor = editor_with(json!([
            {"id": 1, "jobTitle": "Engineer", "employer": "Acme", "current": "true", "endDate": "2024"},
            "{\"title\":\"Intern\",\"company\":\"Globex\"}",
            "not an entry"
        ]));
        let entries = editor.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "1");
        assert_eq!(entries[0].job_title, "Engineer");
        assert!(entries[0].current);
        assert_eq!(entries[0].end_date, "");
        assert_eq!(entries[1].job_title, "Intern");
        assert_eq!(entries[1].employer, "Globex");
        assert_eq!(editor.to_value()[2], json!("not an entry"));
    }

    #[test]
    fn test_unknown_keys_and_non_object_entries_survive_publish() {
        let editor = editor_with(json!([
            {"id": 1, "jobTitle": "Eng", "employer": "Acme", "location": "Oslo", "achievements": ["x"]},
            "freelance 2019"
        ]));
        assert_eq!(editor.entries().len(), 1);

        let published = editor.to_value();
        assert_eq!(published.as_array().unwrap().len(), 2);
        assert_eq!(published[0]["location"], json!("Oslo"));
        assert_eq!(published[0]["achievements"], json!(["x"]));
        assert_eq!(published[0]["jobTitle"], json!("Eng"));
        assert_eq!(published[1], json!("freelance 2019"));
    }

    #[test]
    fn test_structured_field_value_kept_as_json_text() {
        let editor = editor_with(json!([{"employer": {"name": "Acme"}, "description": null}]));
        let entries = editor.entries();
        let entry = &entries[0];
        assert_eq!(entry.employer, "{\"name\":\"Acme\"}");
        assert_eq!(entry.description, "");
    }

    #[test]
    fn test_opaque_entries_do_not_count_toward_last_entry() {
        let mut editor = editor_with(json!(["freelance", {"id": "a"}]));
        assert!(!editor.ensure_entry());
        assert!(!editor.remove("a"));
        assert_eq!(editor.to_value().as_array().unwrap().len(), 2);

        let mut only_opaque = editor_with(json!(["freelance"]));
        assert!(only_opaque.ensure_entry());
        assert_eq!(only_opaque.to_value()[0], json!("freelance"));
    }

    #[test]
    fn test_update_keeps_extra_keys() {
        let mut editor = editor_with(json!([{"id": "a", "location": "Oslo"}]));
        editor.update("a", WorkField::Employer, &json!("Acme")).unwrap();
        let published = editor.to_value();
        assert_eq!(published[0]["employer"], json!("Acme"));
        assert_eq!(published[0]["location"], json!("Oslo"));
    }

    #[test]
    fn test_duplicate_ids_are_made_unique() {
        let editor = editor_with(json!([{"id": "a"}, {"id": "a"}]));
        let entries = editor.entries();
        let ids: HashSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_add_generates_unique_ids() {
        let mut editor = WorkHistoryEditor::default();
        let a = editor.add();
        let b = editor.add();
        assert_ne!(a, b);
        assert_eq!(editor.entries().len(), 2);
    }

    #[test]
    fn test_remove_last_entry_is_noop() {
        let mut editor = WorkHistoryEditor::default();
        editor.ensure_entry();
        let id = editor.entries()[0].id.clone();
        assert!(!editor.remove(&id));
        assert_eq!(editor.entries().len(), 1);
    }

    #[test]
    fn test_remove_by_id() {
        let mut editor = WorkHistoryEditor::default();
        let first = editor.add();
        let second = editor.add();
        assert!(editor.remove(&first));
        assert_eq!(editor.entries().len(), 1);
        assert_eq!(editor.entries()[0].id, second);
        assert!(!editor.remove("unknown"));
    }

    #[test]
    fn test_setting_current_clears_end_date() {
        let mut editor = WorkHistoryEditor::default();
        let id = editor.add();
        editor.update(&id, WorkField::EndDate, &json!("2023-05-01")).unwrap();
        let entry = editor.update(&id, WorkField::Current, &json!(true)).unwrap();
        assert!(entry.current);
        assert_eq!(entry.end_date, "");
    }

    #[test]
    fn test_end_date_ignored_while_current() {
        let mut editor = WorkHistoryEditor::default();
        let id = editor.add();
        editor.update(&id, WorkField::Current, &json!(true)).unwrap();
        let entry = editor.update(&id, WorkField::EndDate, &json!("2023-05-01")).unwrap();
        assert_eq!(entry.end_date, "");
    }

    #[test]
    fn test_update_rejects_wrong_types_and_unknown_ids() {
        let mut editor = WorkHistoryEditor::default();
        let id = editor.add();
        assert!(matches!(
            editor.update(&id, WorkField::Current, &json!("maybe")),
            Err(WorkHistoryError::InvalidValue { field: "current", .. })
        ));
        assert!(matches!(
            editor.update(&id, WorkField::Employer, &json!(3)),
            Err(WorkHistoryError::InvalidValue { field: "employer", .. })
        ));
        assert_eq!(
            editor.update("nope", WorkField::Employer, &json!("x")).unwrap_err(),
            WorkHistoryError::NotFound("nope".to_string())
        );
    }

    #[test]
    fn test_publish_republishes_whole_sequence() {
        let mut editor = WorkHistoryEditor::default();
        let id = editor.add();
        editor.update(&id, WorkField::JobTitle, &json!("Engineer")).unwrap();
        let partial = editor.publish();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[WORK_EXPERIENCES_KEY][0]["jobTitle"], json!("Engineer"));
        assert_eq!(partial[WORK_EXPERIENCES_KEY][0]["id"], json!(id));
    }
}
