//! End-to-end run: extraction, indexing, hybrid retrieval and ranking.
//!
//! Collaborators are built once from the resolved config and credentials and
//! passed by reference into each stage.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use rayon::prelude::*;
use shortlist_core::config::{Credentials, ShortlistConfig, VectorBackend};
use shortlist_core::timing::timed;
use shortlist_core::{
    CandidateFields, ExtractionError, JobRequirement, MatchError, RecordStore, SourceDocument,
    normalize, years_mentioned,
};
use shortlist_llm::{GeminiClient, GeminiEmbedder, Generator, JobPosting, extract_job, extract_resume};
use shortlist_search::dense::{IndexSpec, PineconeStore, SqliteVecStore, VectorStore};
use shortlist_search::semantic::Embedder;
use shortlist_search::{
    DenseRetriever, FusedCandidateSet, HashEmbedder, IndexHandle, RetrievalParams, hybrid_retrieve,
};
use tracing::{info, instrument};

/// How candidate and job fields are obtained.
pub enum Extraction<'g> {
    /// Ask a generative model.
    Generative(&'g dyn Generator),
    /// Derive fields from the normalized text alone, without network access.
    Heuristic,
}

/// Corpus and job requirement ready for retrieval.
#[derive(Debug)]
pub struct PreparedRun {
    pub store: RecordStore,
    pub job: JobRequirement,
    pub posting: Option<JobPosting>,
}

/// Build the Gemini generator from config and credentials.
///
/// # Errors
///
/// Fails when `GEMINI_API_KEY` is not set.
pub fn build_generator(
    config: &ShortlistConfig,
    credentials: &Credentials,
) -> Result<GeminiClient, MatchError> {
    Ok(GeminiClient::new(credentials.require_gemini()?, &config.llm))
}

/// Build the dense retriever for the configured backend.
///
/// Offline runs always use the hash embedder over the SQLite store.
///
/// # Errors
///
/// Fails on missing credentials, an unopenable store, or an embedder whose
/// width differs from the index dimension.
pub fn build_retriever(
    config: &ShortlistConfig,
    credentials: &Credentials,
    offline: bool,
) -> Result<DenseRetriever, MatchError> {
    let spec = IndexSpec::from(&config.vector);
    let sqlite_path = config.vector.sqlite_path.as_deref();

    let (embedder, store): (Box<dyn Embedder>, Box<dyn VectorStore>) = if offline {
        (
            Box::new(HashEmbedder::new(spec.dimension)),
            Box::new(SqliteVecStore::open(sqlite_path)?),
        )
    } else {
        let embedder = GeminiEmbedder::new(credentials.require_gemini()?, &config.llm, spec.dimension);
        let store: Box<dyn VectorStore> = match config.vector.backend {
            VectorBackend::Pinecone => Box::new(PineconeStore::new(
                credentials.require_pinecone()?,
                &config.vector,
                Duration::from_secs(config.llm.timeout_secs),
            )),
            VectorBackend::Sqlite => Box::new(SqliteVecStore::open(sqlite_path)?),
        };
        (Box::new(embedder), store)
    };

    Ok(DenseRetriever::new(embedder, store, spec)?)
}

/// Fields derived without a model: the first line of the normalized text is
/// the name, and the largest duration phrase is the experience.
#[must_use]
pub fn heuristic_fields(document: &SourceDocument) -> CandidateFields {
    let text = normalize(&document.raw_text);
    let name = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map_or_else(|| file_stem(&document.origin), str::to_string);

    CandidateFields {
        name,
        experience_years: years_mentioned(&text).unwrap_or(0),
        skills: BTreeSet::new(),
        text,
        origin: document.origin.clone(),
    }
}

fn file_stem(origin: &str) -> String {
    Path::new(origin)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(origin)
        .to_string()
}

/// Extract every resume in parallel, then assign ids in source order.
///
/// # Errors
///
/// Returns the first extraction failure in source order.
#[instrument(skip_all, fields(resumes = documents.len()))]
pub fn build_corpus(
    extraction: &Extraction<'_>,
    documents: &[SourceDocument],
) -> Result<RecordStore, ExtractionError> {
    let fields = match extraction {
        Extraction::Generative(generator) => documents
            .par_iter()
            .map(|document| extract_resume(*generator, document))
            .collect::<Result<Vec<_>, _>>()?,
        Extraction::Heuristic => documents.iter().map(heuristic_fields).collect(),
    };

    let mut store = RecordStore::new();
    for entry in fields {
        store.add_record(entry);
    }
    info!(records = store.len(), "candidate records built");
    Ok(store)
}

/// Derive the job requirement. `min_experience` overrides whatever the job
/// text states.
///
/// # Errors
///
/// Returns an [`ExtractionError`] when generative job extraction fails.
pub fn build_job(
    extraction: &Extraction<'_>,
    raw: &str,
    min_experience: Option<u32>,
) -> Result<(JobRequirement, Option<JobPosting>), ExtractionError> {
    let (mut job, posting) = match extraction {
        Extraction::Generative(generator) => {
            let (posting, job) = extract_job(*generator, raw)?;
            (job, Some(posting))
        }
        Extraction::Heuristic => {
            let text = normalize(raw);
            let years = years_mentioned(&text).unwrap_or(0);
            (JobRequirement::new(text, years), None)
        }
    };
    if let Some(years) = min_experience {
        job.min_experience_years = years;
    }
    Ok((job, posting))
}

/// Validate inputs and run both extraction stages.
///
/// Blank job text and an empty document list fail before any model call.
///
/// # Errors
///
/// Returns [`MatchError::Input`] or [`MatchError::Extraction`].
pub fn prepare(
    extraction: &Extraction<'_>,
    job_raw: &str,
    documents: &[SourceDocument],
    min_experience: Option<u32>,
) -> Result<PreparedRun, MatchError> {
    if job_raw.trim().is_empty() {
        return Err(shortlist_core::InputError::MissingJobDescription.into());
    }
    if documents.is_empty() {
        return Err(shortlist_core::InputError::NoResumes.into());
    }

    let store = timed("stage.extract_resumes", || build_corpus(extraction, documents))?;
    let (job, posting) = timed("stage.extract_job", || build_job(extraction, job_raw, min_experience))?;
    info!(
        min_experience = job.min_experience_years,
        candidates = store.len(),
        "job requirement ready"
    );
    Ok(PreparedRun {
        store,
        job,
        posting,
    })
}

/// Rebuild the dense index over the corpus and run hybrid retrieval.
///
/// # Errors
///
/// Returns [`MatchError::IndexService`] when indexing or the dense query fails.
pub fn retrieve<'a>(
    run: &'a PreparedRun,
    retriever: &DenseRetriever,
    params: &RetrievalParams,
) -> Result<(IndexHandle, FusedCandidateSet<'a>), MatchError> {
    let corpus = run.store.all_records();
    let handle = timed("stage.index", || retriever.index(corpus))?;
    let fused = timed("stage.retrieve", || {
        hybrid_retrieve(corpus, &run.job, retriever, &handle, params)
    })?;
    Ok((handle, fused))
}
