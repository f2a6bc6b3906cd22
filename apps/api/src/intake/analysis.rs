//! Resume analysis: raw resume text in, schema-less record out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::intake::prompts::{RESUME_ANALYSIS_PROMPT, RESUME_ANALYSIS_SYSTEM};
use crate::llm_client::prompts::fill;
use crate::llm_client::{complete_json, LanguageModel, LlmError};
use crate::record::Record;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model reply is JSON but not an object")]
    NotAnObject,
}

/// Optional feedback block the model returns next to the parsed resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeAnalysis {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub key_highlights: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Raw, unsanitized record as the model produced it.
    pub record: Record,
    pub analysis: Option<ResumeAnalysis>,
}

/// Sends the extracted text to the model. Malformed or non-object output is a
/// hard failure: no partial record is produced.
pub async fn analyze_resume(
    llm: &dyn LanguageModel,
    resume_text: &str,
) -> Result<AnalysisOutcome, AnalysisError> {
    let prompt = fill(RESUME_ANALYSIS_PROMPT, &[("resume_text", resume_text)]);
    let reply: Value = complete_json(llm, &prompt, RESUME_ANALYSIS_SYSTEM).await?;
    let outcome = into_outcome(reply)?;
    info!(
        fields = outcome.record.len(),
        has_analysis = outcome.analysis.is_some(),
        "Resume analysis parsed"
    );
    Ok(outcome)
}

/// Accepts either `{"parsedResume": {...}, "analysis": {...}}` or a bare
/// record object.
fn into_outcome(reply: Value) -> Result<AnalysisOutcome, AnalysisError> {
    let Value::Object(mut top) = reply else {
        return Err(AnalysisError::NotAnObject);
    };

    let analysis = top.remove("analysis").and_then(|raw| {
        serde_json::from_value::<ResumeAnalysis>(raw)
            .map_err(|e| warn!("Ignoring malformed analysis block: {e}"))
            .ok()
    });

    let record = match top.remove("parsedResume") {
        Some(Value::Object(parsed)) => parsed,
        Some(_) => return Err(AnalysisError::NotAnObject),
        None => top,
    };

    Ok(AnalysisOutcome { record, analysis })
}
