//! Prompt templates for extraction and final ranking.

const JSON_INSTRUCTIONS: &str =
    "Return a JSON object only, with no commentary before or after it.";

/// Prompt asking for structured resume fields.
#[must_use]
pub fn resume_prompt(resume_data: &str) -> String {
    format!(
        "### SCRAPED TEXT FROM RESUME:
{resume_data}

### INSTRUCTION:
The scraped text above is from a candidate's resume.
Extract the key information and return it as JSON with these fields:

- `name`: Full name of the candidate.
- `email`: Candidate's email address.
- `phone`: Candidate's phone number (if available).
- `role`: Current or most recent job title or designation, with company details.
- `experience_years`: Total years of experience as an integer; 0 when not stated.
- `skills`: List of technical and soft skills mentioned (normalized and deduplicated).
- `education`: Highest qualification and institution.
- `projects`: List of key projects, each an object with `title` and `description`.
- `certifications`: List of certifications or courses (if any).
- `summary`: A brief 2-3 sentence professional summary based on the resume.

If any field is missing, use the string \"not available\".

{JSON_INSTRUCTIONS}
"
    )
}

/// Prompt asking for structured job-posting fields.
#[must_use]
pub fn job_post_prompt(job_post: &str) -> String {
    format!(
        "### SCRAPED TEXT FROM WEBSITE:
{job_post}

### INSTRUCTION:
The scraped text above is from the careers or jobs page of a company website.
Extract the job postings and return them in strict JSON.

The top-level key is `job_posting`; its value is a list of objects with:

- `role`: The job title or designation.
- `company`: Name of the company (if mentioned).
- `location`: Job location (city, state, or remote/hybrid if specified).
- `experience_required`: Required experience in years as an integer; 0 when not stated.
- `skills`: A list of technical and soft skills explicitly mentioned.
- `skill_classification`: The extracted skills split into buckets:
    - `must_have`: essential or required skills.
    - `important`: valuable but not strictly required skills.
    - `nice_to_have`: additional or preferred skills.
  Use [\"None\"] for an empty bucket.
- `description`: A clean 2-3 sentence summary of responsibilities and qualifications.
- `employment_type`: Full-time, Part-time, Internship, Contract, etc., if available.
- `posted_date`: Date of posting (if available).

### RETURN ONLY VALID JSON, NO PREAMBLE.
{JSON_INSTRUCTIONS}
"
    )
}

/// Prompt asking the model to evaluate and rank the shortlisted candidates.
#[must_use]
pub fn candidate_matching_prompt(job_description: &str, candidate_context: &str) -> String {
    format!(
        "Evaluate and score the candidates through a structured, multi-dimensional framework
that measures alignment with the job requirements.

Use the following criteria:
- Skill alignment
- Experience relevance
- Educational fit
- Role compatibility
- Overall suitability

For each candidate:
- Summarize strengths
- Identify skill gaps
- Provide an overall fit score as a percentage out of 100%
- Provide a confidence level for the score

After evaluating all candidates:
- Produce a ranked list from strongest to weakest match
- Include detailed explanations for ranking decisions

Job Description:
{job_description}

Candidates:
{candidate_context}
"
    )
}
