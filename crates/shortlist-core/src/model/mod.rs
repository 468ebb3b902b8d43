//! Per-run data model: source documents, candidate records and the job requirement.

pub mod document;
pub mod job;
pub mod record;

pub use document::SourceDocument;
pub use job::JobRequirement;
pub use record::{CandidateFields, CandidateId, CandidateRecord, RecordStore};
