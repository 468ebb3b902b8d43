//! Extraction and ranking against a scripted generator.

use std::sync::Mutex;

use shortlist_core::{ExtractionError, RecordStore, SourceDocument};
use shortlist_llm::extract::JOB_ORIGIN;
use shortlist_llm::rank::RANKING_ORIGIN;
use shortlist_llm::{Generator, LlmError, extract_job, extract_resume, rank_candidates};
use shortlist_search::fusion::{RetrievalResult, fuse};

/// Answers with the first scripted reply whose key occurs in the prompt and
/// records every prompt it sees.
struct ScriptedGenerator {
    replies: Vec<(&'static str, Result<String, LlmError>)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<(&'static str, Result<String, LlmError>)>) -> Self {
        Self {
            replies,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().expect("prompts lock").push(prompt.to_string());
        self.replies
            .iter()
            .find(|(key, _)| prompt.contains(key))
            .map_or(Err(LlmError::EmptyResponse), |(_, reply)| reply.clone())
    }
}

const ADA_REPLY: &str = r#"```json
{
  "name": "Ada Byron",
  "email": "ada@example.com",
  "experience_years": "8",
  "skills": ["Rust", "Tokio"],
  "summary": "Backend engineer."
}
```"#;

#[test]
fn resume_is_normalized_before_prompting() {
    let generator = ScriptedGenerator::new(vec![("Ada", Ok(ADA_REPLY.to_string()))]);
    let document = SourceDocument::new(
        "resumes/ada.txt",
        "<b>Ada Byron</b> | ada@example.com | https://ada.dev | 8 years of Rust!",
    );

    let fields = extract_resume(&generator, &document).expect("fields");
    assert_eq!(fields.name, "Ada Byron");
    assert_eq!(fields.experience_years, 8);
    assert_eq!(fields.origin, "resumes/ada.txt");
    assert!(fields.skills.contains("rust"));
    assert!(fields.text.starts_with("Name: Ada Byron\n"));

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Ada Byron ada@example.com 8 years of Rust"));
    assert!(!prompts[0].contains("<b>"));
    assert!(!prompts[0].contains("https://"));
}

#[test]
fn malformed_reply_names_the_resume() {
    let generator = ScriptedGenerator::new(vec![("Bo", Ok("sorry, no idea".to_string()))]);
    let document = SourceDocument::new("bo.txt", "Bo Diddley");
    let err = extract_resume(&generator, &document).unwrap_err();
    assert!(matches!(err, ExtractionError::Malformed { .. }));
    assert_eq!(err.origin(), "bo.txt");
}

#[test]
fn generator_failure_is_an_extraction_error() {
    let generator = ScriptedGenerator::new(vec![(
        "Cy",
        Err(LlmError::Transport("connection refused".to_string())),
    )]);
    let err = extract_resume(&generator, &SourceDocument::new("cy.txt", "Cy Young")).unwrap_err();
    assert!(matches!(err, ExtractionError::Generator { ref detail, .. } if detail.contains("connection refused")));
    assert_eq!(err.origin(), "cy.txt");
}

#[test]
fn job_extraction_yields_requirement() {
    let reply = r#"{"job_posting": [{
        "role": "Rust Engineer",
        "company": "Acme",
        "experience_required": 4,
        "skills": ["Rust"],
        "skill_classification": {"must_have": ["Rust"], "important": ["None"], "nice_to_have": ["None"]},
        "description": "Build services."
    }]}"#;
    let generator = ScriptedGenerator::new(vec![("Acme", Ok(reply.to_string()))]);

    let (posting, requirement) =
        extract_job(&generator, "Acme is hiring a Rust engineer with 4+ years").expect("job");
    assert_eq!(posting.company, "Acme");
    assert_eq!(requirement.min_experience_years, 4);
    assert!(requirement.text.starts_with("Role: Rust Engineer"));
}

#[test]
fn job_without_postings_fails_with_job_origin() {
    let generator =
        ScriptedGenerator::new(vec![("Acme", Ok(r#"{"job_posting": []}"#.to_string()))]);
    let err = extract_job(&generator, "Acme").unwrap_err();
    assert_eq!(err.origin(), JOB_ORIGIN);
    assert!(matches!(err, ExtractionError::MissingField { .. }));
}

#[test]
fn ranking_sees_candidates_in_fused_order() {
    let mut store = RecordStore::new();
    for (name, text) in [("Ada", "ADA TEXT"), ("Bo", "BO TEXT"), ("Cy", "CY TEXT")] {
        store.add_record(shortlist_core::CandidateFields {
            name: name.to_string(),
            experience_years: 3,
            skills: std::collections::BTreeSet::new(),
            text: text.to_string(),
            origin: format!("{name}.txt"),
        });
    }
    let records = store.all_records();
    let dense: RetrievalResult<'_> = [&records[2]].into_iter().collect();
    let sparse: RetrievalResult<'_> = [&records[0], &records[2]].into_iter().collect();
    let metadata = RetrievalResult::default();
    let fused = fuse(&dense, &sparse, &metadata);

    let generator = ScriptedGenerator::new(vec![(
        "Job Description",
        Ok("1. Cy\nstrong\n\n2. Ada\nok".to_string()),
    )]);
    let report = rank_candidates(&generator, "JOB", &fused).expect("report");
    assert_eq!(report.blocks.len(), 2);

    let prompt = &generator.prompts()[0];
    let cy = prompt.find("CY TEXT").expect("cy");
    let ada = prompt.find("ADA TEXT").expect("ada");
    assert!(cy < ada);
    assert!(!prompt.contains("BO TEXT"));
    assert!(prompt.contains("CY TEXT\n\nADA TEXT"));
}

#[test]
fn ranking_calls_generator_for_empty_shortlist() {
    let empty = RetrievalResult::default();
    let fused = fuse(&empty, &empty, &empty);
    let generator = ScriptedGenerator::new(vec![("Job Description", Ok("none fit".to_string()))]);

    let report = rank_candidates(&generator, "JOB", &fused).expect("report");
    assert_eq!(report.raw, "none fit");
    assert_eq!(generator.prompts().len(), 1);
}

#[test]
fn ranking_failure_is_tagged() {
    let empty = RetrievalResult::default();
    let fused = fuse(&empty, &empty, &empty);
    let generator = ScriptedGenerator::new(vec![]);
    let err = rank_candidates(&generator, "JOB", &fused).unwrap_err();
    assert_eq!(err.origin(), RANKING_ORIGIN);
}
