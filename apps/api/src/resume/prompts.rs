// Prompt constants for résumé parsing.

/// Résumé parsing prompt template. Replace `{resume_text}` before sending.
/// Sent with `llm_client::prompts::JSON_ONLY_SYSTEM`.
pub const RESUME_PARSE_PROMPT_TEMPLATE: &str = r#"Parse this resume text into structured JSON. Return a JSON object with these EXACT fields:
{
  "name": "Full Name",
  "email": "email@example.com",
  "phone": "phone number",
  "skills": ["skill1", "skill2", "skill3"],
  "education": [
    {"degree": "degree name", "institution": "school name", "year": "graduation year"}
  ],
  "experience": [
    {"title": "job title", "company": "company name", "duration": "duration", "description": "job description"}
  ],
  "projects": [
    {"name": "project name", "description": "project description", "technologies": ["tech1", "tech2"]}
  ],
  "certifications": ["cert1", "cert2"]
}

Use empty strings or empty arrays for anything the resume does not mention.

Resume Text:
{resume_text}"#;
