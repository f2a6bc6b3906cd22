//! The resume record: a schema-less, ordered JSON mapping plus the pieces that
//! own it (store), address into it (path) and normalize it (sanitize).

pub mod handlers;
pub mod path;
pub mod sanitize;
pub mod store;

use serde_json::{Map, Value};

/// An ordered mapping from field name to value. `serde_json` is built with
/// `preserve_order`, so keys keep the order the LLM produced them in.
pub type Record = Map<String, Value>;

/// Top-level key of the work-history sequence.
pub const WORK_EXPERIENCES_KEY: &str = "workExperiences";

/// Fields of the all-empty record, in display order.
const SKELETON_FIELDS: &[&str] = &[
    "name",
    "yoe",
    "skills",
    "education",
    WORK_EXPERIENCES_KEY,
    "projects",
    "certifications",
    "languages",
    "contact",
];

/// The fixed all-empty record used at startup and on reset.
pub fn skeleton() -> Record {
    SKELETON_FIELDS
        .iter()
        .map(|&field| {
            let value = if field == WORK_EXPERIENCES_KEY {
                Value::Array(Vec::new())
            } else {
                Value::String(String::new())
            };
            (field.to_string(), value)
        })
        .collect()
}
