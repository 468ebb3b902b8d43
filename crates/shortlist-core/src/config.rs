//! Per-run configuration.
//!
//! A [`ShortlistConfig`] is resolved once at process start from, in order of
//! precedence, an explicit `--config` path, the project file
//! `.shortlist/config.toml`, or the user file `<config_dir>/shortlist/config.toml`.
//! Every field carries a serde default, so a missing file or a partial file
//! both resolve to a complete config.
//!
//! API credentials never live in the TOML files. They are read from the
//! environment into [`Credentials`] and passed by reference alongside the
//! config into each run.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortlistConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub vector: VectorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            temperature: default_temperature(),
            embedding_model: default_embedding_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Result bound for the dense and sparse channels.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f64,
    #[serde(default = "default_bm25_b")]
    pub bm25_b: f64,
    #[serde(default = "default_bm25_epsilon")]
    pub bm25_epsilon: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
            bm25_epsilon: default_bm25_epsilon(),
        }
    }
}

/// Which vector store backs the dense channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    /// Serverless Pinecone index over HTTPS.
    #[default]
    Pinecone,
    /// Local SQLite table, ranked with sqlite-vec when available.
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorConfig {
    #[serde(default)]
    pub backend: VectorBackend,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_cloud")]
    pub cloud: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// SQLite database file; in-memory when absent.
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
    #[serde(default = "default_ready_poll_attempts")]
    pub ready_poll_attempts: u32,
    #[serde(default = "default_ready_poll_interval_ms")]
    pub ready_poll_interval_ms: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::default(),
            index_name: default_index_name(),
            dimension: default_dimension(),
            cloud: default_cloud(),
            region: default_region(),
            sqlite_path: None,
            ready_poll_attempts: default_ready_poll_attempts(),
            ready_poll_interval_ms: default_ready_poll_interval_ms(),
        }
    }
}

/// API credentials resolved from the environment at process start.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub gemini_api_key: Option<String>,
    pub pinecone_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "pinecone_api_key",
                &self.pinecone_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup (tests inject a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            gemini_api_key: read(GEMINI_API_KEY_ENV),
            pinecone_api_key: read(PINECONE_API_KEY_ENV),
        }
    }

    /// The Gemini key, or a [`ConfigError::MissingCredential`].
    pub fn require_gemini(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential(GEMINI_API_KEY_ENV))
    }

    /// The Pinecone key, or a [`ConfigError::MissingCredential`].
    pub fn require_pinecone(&self) -> Result<&str, ConfigError> {
        self.pinecone_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential(PINECONE_API_KEY_ENV))
    }
}

/// Parse a config file. A missing file is an error here; callers that want
/// defaults go through [`resolve_config`].
pub fn load_config_file(path: &Path) -> Result<ShortlistConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
        path: path.display().to_string(),
        detail: err.to_string(),
    })?;

    toml::from_str::<ShortlistConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        detail: err.to_string(),
    })
}

/// Path of the project config under `project_root`.
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".shortlist/config.toml")
}

/// Path of the user config, if the platform has a config directory.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("shortlist/config.toml"))
}

/// Resolve the effective config for a run.
///
/// An explicit path must exist. Otherwise the project file wins over the user
/// file, and defaults apply when neither exists.
pub fn resolve_config(
    project_root: &Path,
    explicit: Option<&Path>,
) -> Result<ShortlistConfig, ConfigError> {
    resolve_config_from(explicit, &project_config_path(project_root), user_config_path().as_deref())
}

fn resolve_config_from(
    explicit: Option<&Path>,
    project: &Path,
    user: Option<&Path>,
) -> Result<ShortlistConfig, ConfigError> {
    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loading explicit config");
        return load_config_file(path);
    }

    if project.exists() {
        tracing::debug!(path = %project.display(), "loading project config");
        return load_config_file(project);
    }

    if let Some(user) = user.filter(|p| p.exists()) {
        tracing::debug!(path = %user.display(), "loading user config");
        return load_config_file(user);
    }

    Ok(ShortlistConfig::default())
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

const fn default_temperature() -> f32 {
    0.7
}

fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_top_k() -> usize {
    5
}

const fn default_bm25_k1() -> f64 {
    1.5
}

const fn default_bm25_b() -> f64 {
    0.75
}

const fn default_bm25_epsilon() -> f64 {
    0.25
}

fn default_index_name() -> String {
    "candidate-matching".to_string()
}

const fn default_dimension() -> usize {
    3072
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

const fn default_ready_poll_attempts() -> u32 {
    30
}

const fn default_ready_poll_interval_ms() -> u64 {
    1000
}
