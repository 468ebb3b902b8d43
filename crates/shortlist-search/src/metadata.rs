//! Attribute-threshold filtering over structured candidate fields.

use shortlist_core::CandidateRecord;

/// Every record satisfying `predicate`, in corpus order. No truncation.
pub fn filter<'a>(
    corpus: &'a [CandidateRecord],
    predicate: impl Fn(&CandidateRecord) -> bool,
) -> Vec<&'a CandidateRecord> {
    corpus.iter().filter(|record| predicate(record)).collect()
}

/// Candidates with at least `min_years` of experience.
#[must_use]
pub fn filter_min_experience(corpus: &[CandidateRecord], min_years: u32) -> Vec<&CandidateRecord> {
    filter(corpus, |record| record.experience_years >= min_years)
}
