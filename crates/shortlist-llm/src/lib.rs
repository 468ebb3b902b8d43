#![forbid(unsafe_code)]
//! shortlist-llm library.
//!
//! The generative collaborators of the pipeline: structured feature
//! extraction for resumes and the job posting, the Gemini embedding client
//! and the final ranking call. Everything goes through the [`Generator`]
//! trait so tests can script replies.

pub mod embed;
pub mod error;
pub mod extract;
pub mod features;
pub mod generator;
pub mod parse;
pub mod prompts;
pub mod rank;

pub use embed::GeminiEmbedder;
pub use error::LlmError;
pub use extract::{extract_job, extract_resume, extract_resume_features};
pub use features::{JobPosting, Project, ResumeFeatures, SkillClassification};
pub use generator::{GeminiClient, Generator};
pub use rank::{RankingReport, rank_candidates};
