#![forbid(unsafe_code)]
//! shortlist-core library.
//!
//! Data model, text normalization, configuration and the error taxonomy
//! shared by the retrieval engine and its collaborators.
//!
//! # Conventions
//!
//! - **Errors**: component boundaries return the typed errors in [`error`];
//!   binaries wrap them in `anyhow`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod timing;

pub use error::{ConfigError, ErrorCode, ExtractionError, IndexServiceError, InputError, MatchError};
pub use model::{CandidateFields, CandidateId, CandidateRecord, JobRequirement, RecordStore, SourceDocument};
pub use normalize::{normalize, years_mentioned};
