//! Strongly-typed resume and job-posting schemas.
//!
//! Model replies are loosely structured: a field may be missing, `null`, the
//! sentinel string `"not available"`, a list where a string was asked for, or
//! a number rendered as text. Validation here maps all of that onto fixed
//! types. Only the documented sentinels are ever substituted: text fields
//! become `"not available"`, list fields become empty and unreadable
//! experience becomes `0`. Anything else that does not fit is an
//! [`ExtractionError`].

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{Map, Value};
use shortlist_core::{CandidateFields, ExtractionError, JobRequirement};
use tracing::warn;

/// Placeholder for a field the model could not fill.
pub const NOT_AVAILABLE: &str = "not available";

/// A project listed on a resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub title: String,
    pub description: String,
}

/// Structured fields extracted from one resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeFeatures {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub experience_years: u32,
    /// Trimmed, lower-cased and deduplicated, in first-seen order.
    pub skills: Vec<String>,
    pub education: String,
    pub projects: Vec<Project>,
    pub certifications: Vec<String>,
    pub summary: String,
}

impl ResumeFeatures {
    /// Validate a decoded model reply.
    ///
    /// `name` and `experience_years` must be present as keys.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::MissingField`] for an absent required key and
    /// [`ExtractionError::InvalidField`] for values outside the schema.
    pub fn from_json(origin: &str, map: &Map<String, Value>) -> Result<Self, ExtractionError> {
        let name = text_value(Some(require(origin, map, "name")?));
        let experience_years =
            years_value(origin, "experience_years", require(origin, map, "experience_years")?)?;

        Ok(Self {
            name,
            email: text_value(map.get("email")),
            phone: text_value(map.get("phone")),
            role: text_value(map.get("role")),
            experience_years,
            skills: normalize_skills(list_value(map.get("skills"))),
            education: text_value(map.get("education")),
            projects: projects_value(map.get("projects")),
            certifications: list_value(map.get("certifications")),
            summary: text_value(map.get("summary")),
        })
    }

    /// Canonical text used for both keyword scoring and embedding.
    #[must_use]
    pub fn to_text(&self) -> String {
        let titles: Vec<&str> = self.projects.iter().map(|p| p.title.as_str()).collect();
        format!(
            "Name: {}\nRole: {}\nExperience: {} years\nSkills: {}\nEducation: {}\nProjects: {}\nSummary: {}\nCertifications: {}",
            self.name,
            self.role,
            self.experience_years,
            join_or_sentinel(&self.skills),
            self.education,
            join_or_sentinel(&titles),
            self.summary,
            join_or_sentinel(&self.certifications),
        )
    }

    /// Fields for the record store, keyed to `origin`.
    #[must_use]
    pub fn into_candidate_fields(self, origin: &str) -> CandidateFields {
        let text = self.to_text();
        CandidateFields {
            name: self.name,
            experience_years: self.experience_years,
            skills: self.skills.into_iter().collect::<BTreeSet<_>>(),
            text,
            origin: origin.to_string(),
        }
    }
}

/// Skill buckets of a posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkillClassification {
    pub must_have: Vec<String>,
    pub important: Vec<String>,
    pub nice_to_have: Vec<String>,
}

/// Structured fields extracted from a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    pub role: String,
    pub company: String,
    pub location: String,
    pub experience_required: u32,
    pub skills: Vec<String>,
    pub skill_classification: SkillClassification,
    pub description: String,
    pub employment_type: String,
    pub posted_date: String,
}

impl JobPosting {
    /// Validate a reply of the form `{"job_posting": [ {...}, ... ]}` and keep
    /// the first posting.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::MissingField`] when `job_posting` is absent
    /// or empty, or the first posting lacks `experience_required`.
    pub fn from_reply(origin: &str, map: &Map<String, Value>) -> Result<Self, ExtractionError> {
        let postings = require(origin, map, "job_posting")?;
        let first = match postings {
            Value::Array(items) => items.first(),
            Value::Object(_) => Some(postings),
            _ => None,
        };
        match first {
            Some(Value::Object(posting)) => Self::from_json(origin, posting),
            Some(_) => Err(ExtractionError::InvalidField {
                origin: origin.to_string(),
                field: "job_posting".to_string(),
                detail: "postings must be JSON objects".to_string(),
            }),
            None => Err(missing(origin, "job_posting")),
        }
    }

    /// Validate a single posting object.
    ///
    /// # Errors
    ///
    /// See [`JobPosting::from_reply`].
    pub fn from_json(origin: &str, posting: &Map<String, Value>) -> Result<Self, ExtractionError> {
        let experience_required = years_value(
            origin,
            "experience_required",
            require(origin, posting, "experience_required")?,
        )?;

        let buckets = posting.get("skill_classification").and_then(Value::as_object);
        let bucket = |key: &str| {
            let values = list_value(buckets.and_then(|b| b.get(key)));
            values
                .into_iter()
                .filter(|value| !value.eq_ignore_ascii_case("none"))
                .collect::<Vec<_>>()
        };

        Ok(Self {
            role: text_value(posting.get("role")),
            company: text_value(posting.get("company")),
            location: text_value(posting.get("location")),
            experience_required,
            skills: dedup(list_value(posting.get("skills"))),
            skill_classification: SkillClassification {
                must_have: bucket("must_have"),
                important: bucket("important"),
                nice_to_have: bucket("nice_to_have"),
            },
            description: text_value(posting.get("description")),
            employment_type: text_value(posting.get("employment_type")),
            posted_date: text_value(posting.get("posted_date")),
        })
    }

    /// Canonical job text, the query for the dense and sparse channels.
    #[must_use]
    pub fn to_text(&self) -> String {
        let bucket = |values: &[String]| {
            if values.is_empty() {
                "None".to_string()
            } else {
                values.join(", ")
            }
        };

        let mut out = String::new();
        let _ = writeln!(out, "Role: {}", self.role);
        let _ = writeln!(out, "Company: {}", self.company);
        let _ = writeln!(out, "Location: {}", self.location);
        let _ = writeln!(out, "Experience Required: {}", self.experience_required);
        let _ = writeln!(out, "Employment Type: {}", self.employment_type);
        let _ = writeln!(out, "Posted Date: {}", self.posted_date);
        out.push('\n');
        let _ = writeln!(out, "Skills: {}", join_or_sentinel(&self.skills));
        out.push('\n');
        out.push_str("Skill Classification:\n");
        let _ = writeln!(out, "  Must Have: {}", bucket(&self.skill_classification.must_have));
        let _ = writeln!(out, "  Important: {}", bucket(&self.skill_classification.important));
        let _ = writeln!(out, "  Nice To Have: {}", bucket(&self.skill_classification.nice_to_have));
        out.push('\n');
        out.push_str("Description:\n");
        out.push_str(&self.description);
        out.trim().to_string()
    }

    #[must_use]
    pub fn to_requirement(&self) -> JobRequirement {
        JobRequirement::new(self.to_text(), self.experience_required)
    }
}

fn require<'m>(
    origin: &str,
    map: &'m Map<String, Value>,
    field: &str,
) -> Result<&'m Value, ExtractionError> {
    map.get(field).ok_or_else(|| missing(origin, field))
}

fn missing(origin: &str, field: &str) -> ExtractionError {
    ExtractionError::MissingField {
        origin: origin.to_string(),
        field: field.to_string(),
    }
}

fn invalid(origin: &str, field: &str, detail: String) -> ExtractionError {
    ExtractionError::InvalidField {
        origin: origin.to_string(),
        field: field.to_string(),
        detail,
    }
}

fn is_sentinel(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case(NOT_AVAILABLE)
}

/// Render any JSON value as a single line of text.
fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render)
            .filter(|item| !is_sentinel(item))
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| (key, render(value)))
            .filter(|(_, value)| !is_sentinel(value))
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn text_value(value: Option<&Value>) -> String {
    let text = value.map(render).unwrap_or_default();
    if is_sentinel(&text) {
        NOT_AVAILABLE.to_string()
    } else {
        text
    }
}

fn list_value(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split(',').map(|part| part.trim().to_string()).collect(),
        Some(Value::Array(items)) => items.iter().map(render).collect(),
        Some(other) => vec![render(other)],
    };
    items.into_iter().filter(|item| !is_sentinel(item)).collect()
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

fn normalize_skills(values: Vec<String>) -> Vec<String> {
    dedup(values.into_iter().map(|value| value.trim().to_lowercase()).collect())
}

fn projects_value(value: Option<&Value>) -> Vec<Project> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(fields) => {
                let title = text_value(fields.get("title").or_else(|| fields.get("name")));
                Some(Project {
                    title,
                    description: text_value(fields.get("description")),
                })
            }
            Value::String(title) if !is_sentinel(title.trim()) => Some(Project {
                title: title.trim().to_string(),
                description: NOT_AVAILABLE.to_string(),
            }),
            _ => None,
        })
        .collect()
}

/// Coerce an experience value to whole years.
fn years_value(origin: &str, field: &str, value: &Value) -> Result<u32, ExtractionError> {
    let years = match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s.trim()),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            return Err(invalid(origin, field, format!("expected a number, got {value}")));
        }
    };

    let Some(years) = years else {
        warn!(origin, field, raw = %value, "experience not available, using 0");
        return Ok(0);
    };
    if years < 0.0 {
        return Err(invalid(origin, field, format!("negative value {years}")));
    }
    if years >= f64::from(u32::MAX) {
        return Err(invalid(origin, field, format!("value {years} out of range")));
    }
    // Range checked above; fractional years truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = years.trunc() as u32;
    Ok(whole)
}

/// Parse the numeric prefix of strings like `"5"`, `"3.5 years"` or `"5+"`.
fn leading_number(text: &str) -> Option<f64> {
    if is_sentinel(text) {
        return None;
    }
    let end = text
        .char_indices()
        .find(|&(idx, c)| !(c.is_ascii_digit() || c == '.' || (c == '-' && idx == 0)))
        .map_or(text.len(), |(idx, _)| idx);
    text[..end].parse::<f64>().ok()
}

fn join_or_sentinel<S: AsRef<str>>(values: &[S]) -> String {
    if values.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        values.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn full_resume() -> Map<String, Value> {
        object(json!({
            "name": "Ada Byron",
            "email": "ada@example.com",
            "phone": "not available",
            "role": "Staff Engineer at Analytical Engines",
            "experience_years": 8,
            "skills": ["Rust", " tokio ", "rust", "PostgreSQL"],
            "education": {"degree": "BSc Mathematics", "institution": "London"},
            "projects": [
                {"title": "Difference engine", "description": "Mechanical calculator"},
                "Note G"
            ],
            "certifications": "not available",
            "summary": "Systems engineer."
        }))
    }

    #[test]
    fn full_resume_validates() {
        let features = ResumeFeatures::from_json("ada.txt", &full_resume()).expect("features");
        assert_eq!(features.name, "Ada Byron");
        assert_eq!(features.phone, NOT_AVAILABLE);
        assert_eq!(features.experience_years, 8);
        assert_eq!(features.skills, ["rust", "tokio", "postgresql"]);
        assert_eq!(features.education, "degree: BSc Mathematics, institution: London");
        assert_eq!(features.projects.len(), 2);
        assert_eq!(features.projects[1].title, "Note G");
        assert!(features.certifications.is_empty());
    }

    #[test]
    fn canonical_text_has_one_field_per_line() {
        let features = ResumeFeatures::from_json("ada.txt", &full_resume()).expect("features");
        let text = features.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name: Ada Byron");
        assert_eq!(lines[2], "Experience: 8 years");
        assert_eq!(lines[3], "Skills: rust, tokio, postgresql");
        assert_eq!(lines[5], "Projects: Difference engine, Note G");
        assert_eq!(lines[7], "Certifications: not available");
    }

    #[test]
    fn missing_required_key_is_reported() {
        let mut map = full_resume();
        map.remove("experience_years");
        let err = ResumeFeatures::from_json("ada.txt", &map).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingField {
                origin: "ada.txt".into(),
                field: "experience_years".into()
            }
        );

        let mut map = full_resume();
        map.remove("name");
        assert!(matches!(
            ResumeFeatures::from_json("ada.txt", &map),
            Err(ExtractionError::MissingField { ref field, .. }) if field == "name"
        ));
    }

    #[test]
    fn optional_fields_default_to_sentinels() {
        let map = object(json!({"name": "Bo", "experience_years": "not available"}));
        let features = ResumeFeatures::from_json("bo.txt", &map).expect("features");
        assert_eq!(features.experience_years, 0);
        assert_eq!(features.email, NOT_AVAILABLE);
        assert_eq!(features.summary, NOT_AVAILABLE);
        assert!(features.skills.is_empty());
        assert!(features.projects.is_empty());
    }

    #[test]
    fn experience_coercions() {
        let years = |value: Value| years_value("x", "experience_years", &value);
        assert_eq!(years(json!(null)), Ok(0));
        assert_eq!(years(json!("")), Ok(0));
        assert_eq!(years(json!("several")), Ok(0));
        assert_eq!(years(json!("5")), Ok(5));
        assert_eq!(years(json!("3.5 years")), Ok(3));
        assert_eq!(years(json!("5+")), Ok(5));
        assert_eq!(years(json!(7.9)), Ok(7));
        assert_eq!(years(json!(0)), Ok(0));
        assert!(matches!(years(json!(-1)), Err(ExtractionError::InvalidField { .. })));
        assert!(matches!(years(json!("-2")), Err(ExtractionError::InvalidField { .. })));
        assert!(matches!(years(json!([3])), Err(ExtractionError::InvalidField { .. })));
    }

    #[test]
    fn candidate_fields_carry_canonical_text() {
        let features = ResumeFeatures::from_json("ada.txt", &full_resume()).expect("features");
        let text = features.to_text();
        let fields = features.into_candidate_fields("resumes/ada.txt");
        assert_eq!(fields.origin, "resumes/ada.txt");
        assert_eq!(fields.text, text);
        assert!(fields.skills.contains("tokio"));
    }

    fn job_reply() -> Map<String, Value> {
        object(json!({
            "job_posting": [
                {
                    "role": "Senior Rust Engineer",
                    "company": "Acme",
                    "location": "Remote",
                    "experience_required": 5,
                    "skills": ["Rust", "Tokio", "Rust"],
                    "skill_classification": {
                        "must_have": ["Rust"],
                        "important": ["Tokio"],
                        "nice_to_have": ["None"]
                    },
                    "description": "Build services.",
                    "employment_type": "Full-time",
                    "posted_date": "not available"
                },
                {"role": "Second", "experience_required": 1}
            ]
        }))
    }

    #[test]
    fn first_job_posting_is_used() {
        let posting = JobPosting::from_reply("job", &job_reply()).expect("posting");
        assert_eq!(posting.role, "Senior Rust Engineer");
        assert_eq!(posting.experience_required, 5);
        assert_eq!(posting.skills, ["Rust", "Tokio"]);
        assert!(posting.skill_classification.nice_to_have.is_empty());
        assert_eq!(posting.posted_date, NOT_AVAILABLE);

        let requirement = posting.to_requirement();
        assert_eq!(requirement.min_experience_years, 5);
        assert_eq!(requirement.text, posting.to_text());
    }

    #[test]
    fn job_text_layout() {
        let text = JobPosting::from_reply("job", &job_reply())
            .expect("posting")
            .to_text();
        assert!(text.starts_with("Role: Senior Rust Engineer\nCompany: Acme\n"));
        assert!(text.contains("Experience Required: 5\n"));
        assert!(text.contains("\n\nSkills: Rust, Tokio\n\n"));
        assert!(text.contains("  Must Have: Rust\n  Important: Tokio\n  Nice To Have: None\n"));
        assert!(text.ends_with("Description:\nBuild services."));
    }

    #[test]
    fn job_reply_without_postings_fails() {
        let err = JobPosting::from_reply("job", &object(json!({"job_posting": []}))).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingField { ref field, .. } if field == "job_posting"));

        let err = JobPosting::from_reply("job", &object(json!({"role": "x"}))).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingField { .. }));
    }

    #[test]
    fn job_posting_requires_experience() {
        let reply = object(json!({"job_posting": [{"role": "x"}]}));
        let err = JobPosting::from_reply("job", &reply).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingField { ref field, .. } if field == "experience_required"));
    }

    #[test]
    fn single_posting_object_is_accepted() {
        let reply = object(json!({"job_posting": {"role": "Solo", "experience_required": "3"}}));
        let posting = JobPosting::from_reply("job", &reply).expect("posting");
        assert_eq!(posting.role, "Solo");
        assert_eq!(posting.experience_required, 3);
    }
}
