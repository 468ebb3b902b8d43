//! End-to-end retrieval over a small resume corpus, fully offline.
//!
//! Uses the hash embedder with an in-memory SQLite vector store so the dense
//! channel behaves like the real one without network access.

use shortlist_core::{CandidateFields, CandidateId, JobRequirement, RecordStore};
use shortlist_search::dense::{DenseRetriever, IndexSpec, Metric, SqliteVecStore};
use shortlist_search::fusion::{Channel, RetrievalParams, RetrievalResult, fuse, hybrid_retrieve};
use shortlist_search::metadata::filter_min_experience;
use shortlist_search::semantic::HashEmbedder;
use shortlist_search::sparse::{self, Bm25Params};
use std::collections::BTreeSet;

const DIM: usize = 256;

fn fields(name: &str, years: u32, skills: &[&str], text: &str) -> CandidateFields {
    CandidateFields {
        name: name.to_string(),
        experience_years: years,
        skills: skills.iter().map(|s| (*s).to_string()).collect::<BTreeSet<_>>(),
        text: text.to_string(),
        origin: format!("{}.txt", name.to_lowercase().replace(' ', "_")),
    }
}

fn build_store() -> RecordStore {
    let mut store = RecordStore::new();
    for entry in [
        fields(
            "Ada Byron",
            8,
            &["rust", "tokio", "postgres"],
            "Name: Ada Byron\nRole: Staff backend engineer\nExperience: 8 years\nSkills: rust, tokio, postgres\nSummary: builds async rust services",
        ),
        fields(
            "Brian Kerr",
            2,
            &["python", "django"],
            "Name: Brian Kerr\nRole: Web developer\nExperience: 2 years\nSkills: python, django\nSummary: ships django web apps",
        ),
        fields(
            "Chen Wu",
            5,
            &["go", "kubernetes"],
            "Name: Chen Wu\nRole: Platform engineer\nExperience: 5 years\nSkills: go, kubernetes\nSummary: runs kubernetes clusters",
        ),
        fields(
            "Dana Reyes",
            1,
            &["rust", "wasm"],
            "Name: Dana Reyes\nRole: Junior engineer\nExperience: 1 years\nSkills: rust, wasm\nSummary: rust and wasm hobby projects",
        ),
        fields(
            "Eli Stone",
            12,
            &["baking"],
            "Name: Eli Stone\nRole: Head pastry chef\nExperience: 12 years\nSkills: baking\nSummary: runs a bakery kitchen",
        ),
    ] {
        store.add_record(entry);
    }
    store
}

fn retriever() -> DenseRetriever {
    DenseRetriever::new(
        Box::new(HashEmbedder::new(DIM)),
        Box::new(SqliteVecStore::open(None).expect("open store")),
        IndexSpec {
            name: "candidate-matching".to_string(),
            dimension: DIM,
            metric: Metric::Cosine,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        },
    )
    .expect("retriever")
}

#[test]
fn record_store_assigns_sequential_ids() {
    let store = build_store();
    let ids: Vec<u64> = store.all_records().iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5]);
}

#[test]
fn sparse_channel_prefers_keyword_overlap() {
    let store = build_store();
    let ranked = sparse::top_k("rust tokio async", store.all_records(), Bm25Params::default(), 2);
    let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Ada Byron", "Dana Reyes"]);
}

#[test]
fn metadata_scenario_one_five_eight() {
    let mut store = RecordStore::new();
    for years in [1, 5, 8] {
        store.add_record(fields(&format!("c{years}"), years, &[], ""));
    }
    let kept = filter_min_experience(store.all_records(), 4);
    let years: Vec<u32> = kept.iter().map(|r| r.experience_years).collect();
    assert_eq!(years, [5, 8]);
}

#[test]
fn fusion_scenario_abcd() {
    let store = build_store();
    let records = store.all_records();
    let (a, b, c, d) = (&records[0], &records[1], &records[2], &records[3]);

    let fused = fuse(
        &RetrievalResult::new(vec![a, b]),
        &RetrievalResult::new(vec![b, c]),
        &RetrievalResult::new(vec![c, d]),
    );
    assert_eq!(fused.ids(), [a.id, b.id, c.id, d.id]);
}

#[test]
fn empty_channels_fuse_to_empty_and_consumers_cope() {
    let fused = fuse(
        &RetrievalResult::default(),
        &RetrievalResult::default(),
        &RetrievalResult::default(),
    );
    assert!(fused.is_empty());
    let context = fused
        .records()
        .map(|record| record.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    assert!(context.is_empty());
}

#[test]
fn hybrid_retrieval_surfaces_every_channel() {
    let store = build_store();
    let corpus = store.all_records();
    let dense = retriever();
    let handle = dense.index(corpus).expect("index");
    assert_eq!(handle.size, 5);

    let job = JobRequirement::new(
        "Role: Senior backend engineer\nSkills: rust, tokio\nDescription: build async rust services",
        6,
    );
    let params = RetrievalParams {
        top_k: 2,
        bm25: Bm25Params::default(),
    };
    let fused = hybrid_retrieve(corpus, &job, &dense, &handle, &params).expect("retrieve");

    let first = &fused.members()[0];
    assert_eq!(first.record.name, "Ada Byron");
    assert_eq!(first.first_seen, Channel::Dense);
    assert_eq!(first.ranks.dense, Some(1));

    // Eli only qualifies through experience.
    let eli = fused
        .iter()
        .find(|member| member.record.name == "Eli Stone")
        .expect("metadata channel keeps Eli");
    assert_eq!(eli.ranks.channels(), [Channel::Metadata]);

    let ids: Vec<CandidateId> = fused.ids();
    let unique: BTreeSet<CandidateId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn reindexing_is_a_destructive_rebuild() {
    let store = build_store();
    let dense = retriever();
    dense.index(store.all_records()).expect("first index");

    let mut smaller = RecordStore::new();
    smaller.add_record(fields("Solo", 3, &["rust"], "rust engineer"));
    let handle = dense.index(smaller.all_records()).expect("second index");

    let hits = dense.query(&handle, "rust tokio async services", 10).expect("query");
    assert_eq!(hits, [CandidateId::new(1)]);
}
