//! Edit session: `loading → editing → submitted`.
//!
//! A session owns a transient shadow copy of the record. Control inputs are
//! interpreted according to the kind of the value they edit and written back
//! through the path mutator; submit reconstitutes the shadow copy into a
//! typed record for the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::form::classify::{classify, FieldKind};
use crate::form::render::{render_field, render_record, ExpansionState, FormNode};
use crate::form::work_history::{WorkExperience, WorkField, WorkHistoryEditor, WorkHistoryError};
use crate::record::path::{array_prefix, get_path, set_path};
use crate::record::sanitize::{reconstitute_record, sanitize, sanitize_record};
use crate::record::{Record, WORK_EXPERIENCES_KEY};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("edit session is already submitted")]
    Closed,

    #[error("'{0}' is a section and cannot be edited directly")]
    SectionNotEditable(String),

    #[error("'{0}' is edited through the work-history editor")]
    WorkHistoryField(String),

    #[error("'{path}' points inside the list at '{list}', which is edited as a whole")]
    InsideList { path: String, list: String },

    #[error("'{path}' expects a number, got '{input}'")]
    InvalidNumber { path: String, input: String },

    #[error("input does not match the {kind:?} control at '{path}'")]
    InputMismatch { path: String, kind: FieldKind },

    #[error(transparent)]
    WorkHistory(#[from] WorkHistoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Editing,
    Submitted,
}

/// Raw input coming back from a control: a checkbox state or typed text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ControlInput {
    Checked(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WorkHistoryOp {
    Add,
    Remove { id: String },
    Update { id: String, field: WorkField, value: Value },
}

#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub path: String,
    pub previous_kind: Option<FieldKind>,
    pub kind: FieldKind,
    /// True when the edit changed the field's control kind.
    pub rerender: bool,
    pub node: FormNode,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub state: SessionState,
    pub base_version: u64,
    pub created_at: DateTime<Utc>,
    pub form: Vec<FormNode>,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    id: Uuid,
    state: SessionState,
    shadow: Record,
    expansion: ExpansionState,
    base_version: u64,
    created_at: DateTime<Utc>,
}

impl EditSession {
    /// Loads a raw record: sanitizes it, derives the expansion state and makes
    /// sure the work-history field (when present) holds at least one entry.
    pub fn load(raw: &Record, base_version: u64) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            state: SessionState::Loading,
            shadow: sanitize_record(raw),
            expansion: ExpansionState::from_record(raw),
            base_version,
            created_at: Utc::now(),
        };

        if session.shadow.contains_key(WORK_EXPERIENCES_KEY) {
            let mut editor = WorkHistoryEditor::from_record(&session.shadow);
            editor.ensure_entry();
            session.publish_work_history(&editor);
        }

        session.state = SessionState::Editing;
        info!(
            session_id = %session.id,
            fields = session.shadow.len(),
            base_version,
            "Edit session loaded"
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn shadow(&self) -> &Record {
        &self.shadow
    }

    pub fn render(&self) -> Vec<FormNode> {
        render_record(&self.shadow, &self.expansion)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            state: self.state,
            base_version: self.base_version,
            created_at: self.created_at,
            form: self.render(),
        }
    }

    /// Applies one control input at `path`.
    pub fn apply_input(&mut self, path: &str, input: ControlInput) -> Result<EditOutcome, SessionError> {
        self.ensure_editing()?;
        let in_work_history = path
            .strip_prefix(WORK_EXPERIENCES_KEY)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'));
        if in_work_history {
            return Err(SessionError::WorkHistoryField(path.to_string()));
        }
        if let Some(list) = array_prefix(&self.shadow, path) {
            return Err(SessionError::InsideList {
                path: path.to_string(),
                list,
            });
        }

        let previous_kind = get_path(&self.shadow, path).map(classify);
        let value = interpret_input(path, previous_kind.unwrap_or(FieldKind::Empty), input)?;
        let kind = classify(&value);
        let rerender = previous_kind != Some(kind);
        if rerender {
            debug!(path, ?previous_kind, ?kind, "Edit changed control kind");
        }

        self.shadow = set_path(&self.shadow, path, value);

        let (parent, key) = path.rsplit_once('.').unwrap_or(("", path));
        let node = match get_path(&self.shadow, path) {
            Some(stored) => render_field(key, stored, parent, &self.expansion),
            None => render_field(key, &Value::Null, parent, &self.expansion),
        };

        Ok(EditOutcome {
            path: path.to_string(),
            previous_kind,
            kind,
            rerender,
            node,
        })
    }

    /// Flips a section between expanded and collapsed. The record is untouched.
    pub fn toggle_section(&mut self, path: &str) -> Result<bool, SessionError> {
        self.ensure_editing()?;
        Ok(self.expansion.toggle(path))
    }

    /// Runs a work-history operation against the shadow copy and republishes
    /// the whole sequence. Removing the last entry is a no-op.
    pub fn apply_work_history(&mut self, op: WorkHistoryOp) -> Result<Vec<WorkExperience>, SessionError> {
        self.ensure_editing()?;
        let mut editor = WorkHistoryEditor::from_record(&self.shadow);
        editor.ensure_entry();
        match op {
            WorkHistoryOp::Add => {
                editor.add();
            }
            WorkHistoryOp::Remove { id } => {
                if !editor.remove(&id) {
                    debug!(id = %id, "Work-history removal refused");
                }
            }
            WorkHistoryOp::Update { id, field, value } => {
                editor.update(&id, field, &value)?;
            }
        }
        self.publish_work_history(&editor);
        Ok(editor.entries())
    }

    /// The typed record the session would submit, without closing it.
    pub fn collect(&self) -> Result<Record, SessionError> {
        self.ensure_editing()?;
        Ok(reconstitute_record(&self.shadow))
    }

    /// Marks the session submitted. Terminal.
    pub fn finish(&mut self) {
        self.state = SessionState::Submitted;
        info!(session_id = %self.id, "Edit session submitted");
    }

    /// `collect` followed by `finish`.
    pub fn submit(&mut self) -> Result<Record, SessionError> {
        let record = self.collect()?;
        self.finish();
        Ok(record)
    }

    fn ensure_editing(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Editing => Ok(()),
            SessionState::Loading | SessionState::Submitted => Err(SessionError::Closed),
        }
    }

    fn publish_work_history(&mut self, editor: &WorkHistoryEditor) {
        for (key, value) in editor.publish() {
            self.shadow.insert(key, sanitize(&value));
        }
    }
}

/// Converts raw control input into the value stored for a field of `kind`.
pub fn interpret_input(path: &str, kind: FieldKind, input: ControlInput) -> Result<Value, SessionError> {
    let mismatch = || SessionError::InputMismatch {
        path: path.to_string(),
        kind,
    };

    match (kind, input) {
        (FieldKind::Section, _) => Err(SessionError::SectionNotEditable(path.to_string())),
        (FieldKind::Checkbox, ControlInput::Checked(checked)) => Ok(Value::Bool(checked)),
        (FieldKind::Checkbox, ControlInput::Text(_)) => Err(mismatch()),
        (_, ControlInput::Checked(_)) => Err(mismatch()),
        (FieldKind::Number, ControlInput::Text(text)) => parse_number(&text)
            .map(Value::Number)
            .ok_or_else(|| SessionError::InvalidNumber {
                path: path.to_string(),
                input: text,
            }),
        (FieldKind::JsonArray, ControlInput::Text(text)) => {
            Ok(serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text)))
        }
        (FieldKind::CommaList, ControlInput::Text(text)) => Ok(Value::Array(
            text.split(',')
                .map(|segment| Value::String(segment.trim().to_string()))
                .collect(),
        )),
        (
            FieldKind::Empty | FieldKind::ShortText | FieldKind::LongText | FieldKind::JsonText,
            ControlInput::Text(text),
        ) => Ok(Value::String(text)),
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}
