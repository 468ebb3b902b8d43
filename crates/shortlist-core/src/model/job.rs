use serde::{Deserialize, Serialize};

/// What the posting asks for, as consumed by the retrieval channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequirement {
    /// Canonical job description text (query for dense and sparse channels).
    pub text: String,
    /// Threshold for the metadata channel.
    pub min_experience_years: u32,
}

impl JobRequirement {
    #[must_use]
    pub fn new(text: impl Into<String>, min_experience_years: u32) -> Self {
        Self {
            text: text.into(),
            min_experience_years,
        }
    }
}
