//! BM25 Okapi over candidate texts.
//!
//! Tokenization is deliberately minimal: lower-case, then split on
//! whitespace. No stemming and no stop words, so punctuation stays attached to
//! its token (`"rust,"` and `"rust"` are different terms).

use std::collections::{BTreeMap, HashMap};

use shortlist_core::config::RetrievalConfig;
use shortlist_core::{CandidateId, CandidateRecord};
use tracing::debug;

/// Tunable BM25 Okapi constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Document-length normalization.
    pub b: f64,
    /// Fraction of the average IDF substituted for negative IDF values.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

impl From<&RetrievalConfig> for Bm25Params {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            k1: config.bm25_k1,
            b: config.bm25_b,
            epsilon: config.bm25_epsilon,
        }
    }
}

/// Lower-case and split on whitespace.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// A BM25 model built over one corpus snapshot.
///
/// The model is rebuilt whenever the corpus changes; there is no incremental
/// update.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    ids: Vec<CandidateId>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    avgdl: f64,
    idf: HashMap<String, f64>,
}

impl Bm25Index {
    /// Build term statistics for `corpus`.
    #[must_use]
    pub fn build(corpus: &[CandidateRecord], params: Bm25Params) -> Self {
        let mut term_freqs = Vec::with_capacity(corpus.len());
        let mut doc_lens = Vec::with_capacity(corpus.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for record in corpus {
            let tokens = tokenize(&record.text);
            doc_lens.push(tokens.len());

            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(freqs);
        }

        let total_len: usize = doc_lens.iter().sum();
        let avgdl = if corpus.is_empty() {
            0.0
        } else {
            total_len as f64 / corpus.len() as f64
        };

        let idf = compute_idf(&doc_freq, corpus.len(), params.epsilon);

        debug!(
            documents = corpus.len(),
            vocabulary = idf.len(),
            avgdl,
            "bm25 index built"
        );

        Self {
            params,
            ids: corpus.iter().map(|record| record.id).collect(),
            term_freqs,
            doc_lens,
            avgdl,
            idf,
        }
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Score every document against `query`, in corpus order.
    ///
    /// Repeated query tokens count once per occurrence. Terms absent from the
    /// corpus contribute nothing.
    #[must_use]
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let query_tokens = tokenize(query);
        let Bm25Params { k1, b, .. } = self.params;

        self.term_freqs
            .iter()
            .zip(&self.doc_lens)
            .map(|(freqs, &doc_len)| {
                let length_ratio = if self.avgdl > 0.0 {
                    doc_len as f64 / self.avgdl
                } else {
                    0.0
                };
                let norm = k1 * (1.0 - b + b * length_ratio);

                query_tokens
                    .iter()
                    .map(|token| {
                        let Some(&count) = freqs.get(token) else {
                            return 0.0;
                        };
                        let idf = self.idf.get(token).copied().unwrap_or(0.0);
                        let tf = f64::from(count);
                        idf * (tf * (k1 + 1.0)) / (tf + norm)
                    })
                    .sum()
            })
            .collect()
    }

    /// Ids ordered by descending score, truncated to `top_k`.
    ///
    /// Equal scores keep corpus order.
    #[must_use]
    pub fn top_k(&self, query: &str, top_k: usize) -> Vec<CandidateId> {
        let scores = self.scores(query);
        let mut order: Vec<usize> = (0..self.ids.len()).collect();
        // `sort_by` is stable, which gives the corpus-order tie-break.
        order.sort_by(|&left, &right| scores[right].total_cmp(&scores[left]));
        order
            .into_iter()
            .take(top_k)
            .map(|idx| self.ids[idx])
            .collect()
    }
}

/// Score `query` against every record in `corpus`.
///
/// An empty corpus yields an empty map; a query with no tokens maps every id
/// to `0.0`.
#[must_use]
pub fn score(query: &str, corpus: &[CandidateRecord], params: Bm25Params) -> BTreeMap<CandidateId, f64> {
    let index = Bm25Index::build(corpus, params);
    index.ids.iter().copied().zip(index.scores(query)).collect()
}

/// Rank `corpus` against `query` and keep the best `top_k` records.
#[must_use]
pub fn top_k<'a>(
    query: &str,
    corpus: &'a [CandidateRecord],
    params: Bm25Params,
    top_k: usize,
) -> Vec<&'a CandidateRecord> {
    let index = Bm25Index::build(corpus, params);
    let by_id: HashMap<CandidateId, &CandidateRecord> =
        corpus.iter().map(|record| (record.id, record)).collect();
    index
        .top_k(query, top_k)
        .into_iter()
        .filter_map(|id| by_id.get(&id).copied())
        .collect()
}

fn compute_idf(doc_freq: &HashMap<String, u32>, n_docs: usize, epsilon: f64) -> HashMap<String, f64> {
    if doc_freq.is_empty() {
        return HashMap::new();
    }

    let n = n_docs as f64;
    let mut idf = HashMap::with_capacity(doc_freq.len());
    let mut idf_sum = 0.0;
    let mut negative = Vec::new();

    for (term, &freq) in doc_freq {
        let freq = f64::from(freq);
        let value = (n - freq + 0.5).ln() - (freq + 0.5).ln();
        idf_sum += value;
        if value < 0.0 {
            negative.push(term.clone());
        }
        idf.insert(term.clone(), value);
    }

    // Terms in more than half of the documents get a small positive weight
    // instead of a penalty. Floored so scores stay non-negative.
    let average_idf = idf_sum / idf.len() as f64;
    let floor = (epsilon * average_idf).max(0.0);
    for term in negative {
        idf.insert(term, floor);
    }

    idf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(id: u64, text: &str) -> CandidateRecord {
        CandidateRecord {
            id: CandidateId::new(id),
            name: format!("candidate-{id}"),
            experience_years: 0,
            skills: BTreeSet::new(),
            text: text.to_string(),
            origin: format!("resume-{id}.txt"),
        }
    }

    fn corpus() -> Vec<CandidateRecord> {
        vec![
            record(1, "Rust developer with tokio and axum"),
            record(2, "Python developer with django"),
            record(3, "Go engineer building kubernetes operators"),
            record(4, "Java developer with spring"),
        ]
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_whitespace() {
        assert_eq!(tokenize("  Rust\tTOKIO\nrust, "), ["rust", "tokio", "rust,"]);
        assert!(tokenize(" \n\t").is_empty());
    }

    #[test]
    fn empty_corpus_scores_to_empty_map() {
        let scores = score("rust", &[], Bm25Params::default());
        assert!(scores.is_empty());
    }

    #[test]
    fn empty_query_scores_zero_for_every_candidate() {
        let corpus = corpus();
        let scores = score("   ", &corpus, Bm25Params::default());
        assert_eq!(scores.len(), corpus.len());
        assert!(scores.values().all(|&s| s == 0.0));
    }

    #[test]
    fn matching_document_scores_highest() {
        let corpus = corpus();
        let scores = score("rust tokio", &corpus, Bm25Params::default());
        let best = scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(id, _)| *id);
        assert_eq!(best, Some(CandidateId::new(1)));
        assert_eq!(scores[&CandidateId::new(2)], 0.0);
    }

    #[test]
    fn matches_reference_idf_for_rare_term() {
        // Four documents, "kubernetes" appears in one: idf = ln(3.5) - ln(1.5).
        let corpus = corpus();
        let index = Bm25Index::build(&corpus, Bm25Params::default());
        let expected_idf = 3.5_f64.ln() - 1.5_f64.ln();
        assert!((index.idf["kubernetes"] - expected_idf).abs() < 1e-12);

        // Document 3 has 5 tokens; avgdl is (6 + 4 + 5 + 4) / 4.
        let avgdl = 19.0 / 4.0;
        let norm = 1.5 * (1.0 - 0.75 + 0.75 * 5.0 / avgdl);
        let expected = expected_idf * 2.5 / (1.0 + norm);
        let scores = index.scores("kubernetes");
        assert!((scores[2] - expected).abs() < 1e-12);
    }

    #[test]
    fn common_terms_use_epsilon_floor() {
        // "developer" is in three of four documents, giving a negative raw idf.
        let corpus = corpus();
        let index = Bm25Index::build(&corpus, Bm25Params::default());
        let value = index.idf["developer"];
        assert!(value >= 0.0);
        assert!(index.scores("developer").iter().all(|s| *s >= 0.0));
    }

    #[test]
    fn repeated_query_terms_count_each_time() {
        let corpus = corpus();
        let index = Bm25Index::build(&corpus, Bm25Params::default());
        let once = index.scores("kubernetes")[2];
        let twice = index.scores("kubernetes kubernetes")[2];
        assert!((twice - 2.0 * once).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let corpus = vec![
            record(7, "alpha one"),
            record(3, "beta shared"),
            record(9, "gamma shared"),
            record(1, "delta two"),
            record(5, "epsilon three"),
        ];
        let ranked = Bm25Index::build(&corpus, Bm25Params::default()).top_k("shared", 5);
        assert_eq!(ranked, [3, 9, 7, 1, 5].map(CandidateId::new));
    }

    #[test]
    fn top_k_truncates() {
        let corpus = corpus();
        let ranked = top_k("developer", &corpus, Bm25Params::default(), 2);
        assert_eq!(ranked.len(), 2);
        assert!(top_k("developer", &corpus, Bm25Params::default(), 0).is_empty());
        assert_eq!(top_k("developer", &corpus, Bm25Params::default(), 99).len(), 4);
    }

    #[test]
    fn all_empty_documents_do_not_divide_by_zero() {
        let corpus = vec![record(1, ""), record(2, "  ")];
        let scores = score("anything", &corpus, Bm25Params::default());
        assert!(scores.values().all(|s| s.is_finite() && *s == 0.0));
    }
}
