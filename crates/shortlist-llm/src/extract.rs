//! Generative feature extraction for resumes and the job posting.

use shortlist_core::{
    CandidateFields, ExtractionError, JobRequirement, SourceDocument, normalize,
};
use tracing::{debug, instrument};

use crate::features::{JobPosting, ResumeFeatures};
use crate::generator::Generator;
use crate::parse::parse_json_object;
use crate::prompts::{job_post_prompt, resume_prompt};

/// Origin label used for errors about the job description.
pub const JOB_ORIGIN: &str = "job description";

/// Normalize one resume, ask the generator for its fields and validate them.
///
/// # Errors
///
/// Returns an [`ExtractionError`] tagged with the document's origin when the
/// generator fails or its reply does not validate.
#[instrument(skip_all, fields(origin = %document.origin))]
pub fn extract_resume_features(
    generator: &dyn Generator,
    document: &SourceDocument,
) -> Result<ResumeFeatures, ExtractionError> {
    let origin = document.origin.as_str();
    let cleaned = normalize(&document.raw_text);
    let reply = generator
        .generate(&resume_prompt(&cleaned))
        .map_err(|err| ExtractionError::Generator {
            origin: origin.to_string(),
            detail: err.to_string(),
        })?;
    debug!(reply_chars = reply.len(), "resume reply received");

    let map = parse_json_object(origin, &reply)?;
    ResumeFeatures::from_json(origin, &map)
}

/// [`extract_resume_features`] reduced to the fields the record store keeps.
///
/// # Errors
///
/// See [`extract_resume_features`].
pub fn extract_resume(
    generator: &dyn Generator,
    document: &SourceDocument,
) -> Result<CandidateFields, ExtractionError> {
    extract_resume_features(generator, document)
        .map(|features| features.into_candidate_fields(&document.origin))
}

/// Normalize the job text and extract the first posting it describes.
///
/// # Errors
///
/// Returns an [`ExtractionError`] with origin [`JOB_ORIGIN`].
#[instrument(skip_all)]
pub fn extract_job(
    generator: &dyn Generator,
    raw: &str,
) -> Result<(JobPosting, JobRequirement), ExtractionError> {
    let cleaned = normalize(raw);
    let reply = generator
        .generate(&job_post_prompt(&cleaned))
        .map_err(|err| ExtractionError::Generator {
            origin: JOB_ORIGIN.to_string(),
            detail: err.to_string(),
        })?;

    let map = parse_json_object(JOB_ORIGIN, &reply)?;
    let posting = JobPosting::from_reply(JOB_ORIGIN, &map)?;
    let requirement = posting.to_requirement();
    debug!(
        role = %posting.role,
        min_experience = requirement.min_experience_years,
        "job posting extracted"
    );
    Ok((posting, requirement))
}
