//! Final generative ranking of the fused shortlist.

use serde::Serialize;
use shortlist_core::ExtractionError;
use shortlist_search::FusedCandidateSet;
use tracing::{info, instrument};

use crate::generator::Generator;
use crate::prompts::candidate_matching_prompt;

/// Origin label for ranking failures.
pub const RANKING_ORIGIN: &str = "final ranking";

/// The generator's evaluation of the shortlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingReport {
    /// Reply exactly as returned.
    pub raw: String,
    /// `raw` split into paragraphs, blank lines removed.
    pub blocks: Vec<String>,
}

/// Canonical texts of the fused candidates in fused order, separated by a
/// blank line.
#[must_use]
pub fn candidate_context(fused: &FusedCandidateSet<'_>) -> String {
    fused
        .records()
        .map(|record| record.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split a reply into paragraphs.
#[must_use]
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// Ask the generator to evaluate the fused candidates against the job.
///
/// The generator is called even when `fused` is empty.
///
/// # Errors
///
/// Returns [`ExtractionError::Generator`] with origin [`RANKING_ORIGIN`] when
/// the call fails.
#[instrument(skip_all, fields(candidates = fused.len()))]
pub fn rank_candidates(
    generator: &dyn Generator,
    job_text: &str,
    fused: &FusedCandidateSet<'_>,
) -> Result<RankingReport, ExtractionError> {
    let prompt = candidate_matching_prompt(job_text, &candidate_context(fused));
    let raw = generator
        .generate(&prompt)
        .map_err(|err| ExtractionError::Generator {
            origin: RANKING_ORIGIN.to_string(),
            detail: err.to_string(),
        })?;
    let blocks = split_blocks(&raw);
    info!(blocks = blocks.len(), "final ranking received");
    Ok(RankingReport { raw, blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_split_on_blank_lines() {
        let blocks = split_blocks("1. Ada\nstrong rust\n\n\n2. Bo  \n   \n3. Cy\n");
        assert_eq!(blocks, ["1. Ada\nstrong rust", "2. Bo", "3. Cy"]);
    }

    #[test]
    fn empty_reply_has_no_blocks() {
        assert!(split_blocks("").is_empty());
        assert!(split_blocks("\n \n").is_empty());
    }
}
