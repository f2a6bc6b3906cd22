// Resume analysis LLM prompt templates.

pub const RESUME_ANALYSIS_SYSTEM: &str = "\
You are a precise resume data extractor. \
Convert raw resume text into structured JSON. \
You MUST respond with valid JSON only, with no markdown fences and no explanations. \
Never invent details that are not present in the text.";

pub const RESUME_ANALYSIS_PROMPT: &str = r#"Analyze the following resume text and extract structured information.
Also provide an analysis of the resume's strengths and areas for improvement.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "parsedResume": {
    "name": "Full name of the candidate",
    "yoe": "Years of experience (if found)",
    "skills": "List of skills",
    "education": "Education details",
    "workExperiences": [
      {
        "id": "number",
        "jobTitle": "Job title",
        "employer": "Company name",
        "description": "Job description",
        "startDate": "Start date",
        "endDate": "End date",
        "current": "Boolean value if currently working"
      }
    ],
    "projects": "Projects; every project has a title and a description with bullet points",
    "certifications": "Any certifications",
    "languages": "Languages known",
    "contact": "Contact information (simple text)"
  },
  "analysis": {
    "strengths": ["string"],
    "improvements": ["string"],
    "keyHighlights": ["string"]
  }
}

RULES:
1. Use an empty string for any field the resume does not mention.
2. Return ONLY the JSON object, with nothing else and no code fences."#;
