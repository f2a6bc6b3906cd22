//! Schema-less form generation over the resume record.

pub mod classify;
pub mod handlers;
pub mod label;
pub mod render;
pub mod session;
pub mod work_history;
