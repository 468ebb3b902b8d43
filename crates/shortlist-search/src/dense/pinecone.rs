//! Pinecone serverless index over its REST API.
//!
//! Control-plane calls (list, create, describe, delete) go to
//! `api.pinecone.io`; data-plane calls (upsert, query) go to the host that
//! the index description reports once it is ready.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use shortlist_core::config::VectorConfig;
use shortlist_core::{CandidateId, IndexServiceError};
use tracing::{debug, info, warn};

use super::store::{IndexSpec, VectorMatch, VectorRecord, VectorStore, sort_matches};

const CONTROL_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";
/// Vectors per upsert request. 3072-wide vectors keep a batch under the
/// request size limit.
const UPSERT_BATCH: usize = 32;

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
}

/// [`VectorStore`] backed by a Pinecone project.
pub struct PineconeStore {
    agent: ureq::Agent,
    api_key: String,
    control_url: String,
    poll_attempts: u32,
    poll_interval: Duration,
    hosts: Mutex<HashMap<String, String>>,
}

impl std::fmt::Debug for PineconeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeStore")
            .field("control_url", &self.control_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl PineconeStore {
    #[must_use]
    pub fn new(api_key: impl Into<String>, config: &VectorConfig, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            api_key: api_key.into(),
            control_url: CONTROL_URL.to_string(),
            poll_attempts: config.ready_poll_attempts.max(1),
            poll_interval: Duration::from_millis(config.ready_poll_interval_ms),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Point control-plane calls somewhere other than `api.pinecone.io`.
    #[must_use]
    pub fn with_control_url(mut self, url: impl Into<String>) -> Self {
        self.control_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn get(&self, url: &str) -> ureq::Request {
        self.agent
            .get(url)
            .set("Api-Key", &self.api_key)
            .set("X-Pinecone-API-Version", API_VERSION)
    }

    fn post(&self, url: &str) -> ureq::Request {
        self.agent
            .post(url)
            .set("Api-Key", &self.api_key)
            .set("X-Pinecone-API-Version", API_VERSION)
    }

    fn describe(&self, name: &str) -> Result<IndexDescription, ureq::Error> {
        let url = format!("{}/indexes/{name}", self.control_url);
        let description: IndexDescription = self.get(&url).call()?.into_json()?;
        Ok(description)
    }

    fn wait_until_ready(&self, name: &str) -> Result<String, IndexServiceError> {
        for attempt in 1..=self.poll_attempts {
            let description = self
                .describe(name)
                .map_err(|e| rebuild_error(name, &describe_failure(&e)))?;
            if description.status.ready && !description.host.is_empty() {
                debug!(index = name, attempt, host = %description.host, "pinecone index ready");
                return Ok(description.host);
            }
            debug!(index = name, attempt, state = %description.status.state, "waiting for pinecone index");
            thread::sleep(self.poll_interval);
        }
        Err(rebuild_error(
            name,
            &format!("index not ready after {} polls", self.poll_attempts),
        ))
    }

    /// Deletion is asynchronous: the name stays taken while the index is
    /// terminating, so poll until describe answers 404.
    fn wait_until_deleted(&self, name: &str) -> Result<(), IndexServiceError> {
        for attempt in 1..=self.poll_attempts {
            match self.describe(name) {
                Err(ureq::Error::Status(404, _)) => {
                    debug!(index = name, attempt, "pinecone index gone");
                    return Ok(());
                }
                Err(e) if is_transport(&e) => {
                    return Err(IndexServiceError::Unreachable(describe_failure(&e)));
                }
                Err(e) => return Err(rebuild_error(name, &describe_failure(&e))),
                Ok(description) => {
                    debug!(index = name, attempt, state = %description.status.state, "waiting for pinecone index deletion");
                    thread::sleep(self.poll_interval);
                }
            }
        }
        Err(rebuild_error(
            name,
            &format!("index still present after {} polls", self.poll_attempts),
        ))
    }

    fn data_url(&self, index: &str, path: &str) -> Result<String, IndexServiceError> {
        if let Some(host) = self.hosts.lock().get(index) {
            return Ok(data_plane_url(host, path));
        }
        let description = self
            .describe(index)
            .map_err(|e| query_error(index, &describe_failure(&e)))?;
        if description.host.is_empty() {
            return Err(query_error(index, "index has no host yet"));
        }
        let url = data_plane_url(&description.host, path);
        self.hosts.lock().insert(index.to_string(), description.host);
        Ok(url)
    }
}

fn data_plane_url(host: &str, path: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}{path}", host.trim_end_matches('/'))
    } else {
        format!("https://{host}{path}")
    }
}

fn describe_failure(err: &ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, _) => format!("HTTP {code}"),
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}

fn failure_detail(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            format!("HTTP {code}: {}", body.trim())
        }
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}

fn is_transport(err: &ureq::Error) -> bool {
    matches!(err, ureq::Error::Transport(_))
}

fn rebuild_error(index: &str, detail: &str) -> IndexServiceError {
    IndexServiceError::Rebuild {
        index: index.to_string(),
        detail: detail.to_string(),
    }
}

fn query_error(index: &str, detail: &str) -> IndexServiceError {
    IndexServiceError::Query {
        index: index.to_string(),
        detail: detail.to_string(),
    }
}

fn create_body(spec: &IndexSpec) -> Value {
    json!({
        "name": spec.name,
        "dimension": spec.dimension,
        "metric": spec.metric.as_str(),
        "spec": {
            "serverless": {
                "cloud": spec.cloud,
                "region": spec.region,
            }
        }
    })
}

fn upsert_body(vectors: &[VectorRecord]) -> Value {
    let vectors: Vec<Value> = vectors
        .iter()
        .map(|vector| {
            json!({
                "id": vector.id.to_string(),
                "values": vector.values,
                "metadata": {
                    "id": vector.metadata.candidate_id.get(),
                    "name": vector.metadata.name,
                    "experience": vector.metadata.experience_years,
                    "skills": vector.metadata.skills,
                }
            })
        })
        .collect();
    json!({ "vectors": vectors })
}

fn query_body(vector: &[f32], top_k: usize) -> Value {
    json!({
        "vector": vector,
        "topK": top_k,
        "includeValues": false,
        "includeMetadata": false,
    })
}

fn parse_matches(response: QueryResponse) -> Vec<VectorMatch> {
    let mut matches: Vec<VectorMatch> = response
        .matches
        .into_iter()
        .filter_map(|hit| match hit.id.parse::<u64>() {
            Ok(raw) => Some(VectorMatch {
                id: CandidateId::new(raw),
                score: hit.score,
            }),
            Err(_) => {
                warn!(id = %hit.id, "ignoring pinecone match with a non-candidate id");
                None
            }
        })
        .collect();
    sort_matches(&mut matches);
    matches
}

impl VectorStore for PineconeStore {
    fn list_indexes(&self) -> Result<Vec<String>, IndexServiceError> {
        let url = format!("{}/indexes", self.control_url);
        let list: IndexList = self
            .get(&url)
            .call()
            .map_err(|e| IndexServiceError::Unreachable(failure_detail(e)))?
            .into_json()
            .map_err(|e| IndexServiceError::Unreachable(format!("malformed index list: {e}")))?;
        Ok(list.indexes.into_iter().map(|index| index.name).collect())
    }

    fn delete_index(&self, name: &str) -> Result<(), IndexServiceError> {
        let url = format!("{}/indexes/{name}", self.control_url);
        self.agent
            .delete(&url)
            .set("Api-Key", &self.api_key)
            .set("X-Pinecone-API-Version", API_VERSION)
            .call()
            .map_err(|e| {
                if is_transport(&e) {
                    IndexServiceError::Unreachable(failure_detail(e))
                } else {
                    rebuild_error(name, &failure_detail(e))
                }
            })?;
        self.hosts.lock().remove(name);
        self.wait_until_deleted(name)?;
        info!(index = name, "pinecone index deleted");
        Ok(())
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<(), IndexServiceError> {
        let url = format!("{}/indexes", self.control_url);
        self.post(&url).send_json(create_body(spec)).map_err(|e| {
            if is_transport(&e) {
                IndexServiceError::Unreachable(failure_detail(e))
            } else {
                rebuild_error(&spec.name, &failure_detail(e))
            }
        })?;

        let host = self.wait_until_ready(&spec.name)?;
        self.hosts.lock().insert(spec.name.clone(), host);
        info!(index = %spec.name, dimension = spec.dimension, "pinecone index created");
        Ok(())
    }

    fn upsert(&self, index: &str, vectors: &[VectorRecord]) -> Result<(), IndexServiceError> {
        if vectors.is_empty() {
            return Ok(());
        }
        let url = self
            .data_url(index, "/vectors/upsert")
            .map_err(|e| rebuild_error(index, &e.to_string()))?;

        for batch in vectors.chunks(UPSERT_BATCH) {
            self.post(&url)
                .send_json(upsert_body(batch))
                .map_err(|e| rebuild_error(index, &failure_detail(e)))?;
            debug!(index, count = batch.len(), "pinecone vectors upserted");
        }
        Ok(())
    }

    fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, IndexServiceError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let url = self.data_url(index, "/query")?;
        let response: QueryResponse = self
            .post(&url)
            .send_json(query_body(vector, top_k))
            .map_err(|e| query_error(index, &failure_detail(e)))?
            .into_json()
            .map_err(|e| query_error(index, &format!("malformed query response: {e}")))?;
        Ok(parse_matches(response))
    }
}
