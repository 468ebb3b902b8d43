use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MissingJobDescription,
    NoResumes,
    ConfigParseError,
    MissingCredential,
    MalformedExtraction,
    MissingExtractionField,
    GeneratorUnavailable,
    IndexServiceUnreachable,
    IndexRebuildFailed,
    IndexQueryFailed,
    EmbeddingDimensionMismatch,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingJobDescription => "E1001",
            Self::NoResumes => "E1002",
            Self::ConfigParseError => "E1003",
            Self::MissingCredential => "E1004",
            Self::MalformedExtraction => "E2001",
            Self::MissingExtractionField => "E2002",
            Self::GeneratorUnavailable => "E2003",
            Self::IndexServiceUnreachable => "E3001",
            Self::IndexRebuildFailed => "E3002",
            Self::IndexQueryFailed => "E3003",
            Self::EmbeddingDimensionMismatch => "E3004",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingJobDescription => "Job description missing",
            Self::NoResumes => "No resumes supplied",
            Self::ConfigParseError => "Config file parse error",
            Self::MissingCredential => "Credential not set",
            Self::MalformedExtraction => "Malformed extraction output",
            Self::MissingExtractionField => "Extraction omitted a required field",
            Self::GeneratorUnavailable => "Generative model unavailable",
            Self::IndexServiceUnreachable => "Vector index service unreachable",
            Self::IndexRebuildFailed => "Vector index rebuild failed",
            Self::IndexQueryFailed => "Vector index query failed",
            Self::EmbeddingDimensionMismatch => "Embedding dimension mismatch",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::MissingJobDescription => Some("Pass a non-empty job description with `--job`."),
            Self::NoResumes => Some("Point `--resumes` at a directory containing .txt or .md resumes."),
            Self::ConfigParseError => Some("Fix syntax in .shortlist/config.toml and retry."),
            Self::MissingCredential => {
                Some("Export GEMINI_API_KEY (and PINECONE_API_KEY for the pinecone backend).")
            }
            Self::MalformedExtraction | Self::MissingExtractionField => {
                Some("Retry the run or skip the offending resume.")
            }
            Self::GeneratorUnavailable => Some("Check network access and the configured model name."),
            Self::IndexServiceUnreachable => {
                Some("Check network access or switch `[vector] backend` to `sqlite`.")
            }
            Self::IndexRebuildFailed | Self::IndexQueryFailed => None,
            Self::EmbeddingDimensionMismatch => {
                Some("Set `[vector] dimension` to the embedding model's output size.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Inputs rejected before any external call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("job description is missing or empty")]
    MissingJobDescription,

    #[error("no resumes supplied")]
    NoResumes,
}

/// Generative feature extraction produced output that cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The generator reply was not a JSON object.
    #[error("extraction output for {origin} is not valid JSON: {detail}")]
    Malformed { origin: String, detail: String },

    /// A required field was absent from the reply.
    #[error("extraction output for {origin} omits required field `{field}`")]
    MissingField { origin: String, field: String },

    /// A field was present but outside its schema (e.g. negative experience).
    #[error("extraction output for {origin} has invalid `{field}`: {detail}")]
    InvalidField {
        origin: String,
        field: String,
        detail: String,
    },

    /// The generator could not be reached or refused the request.
    #[error("generator call for {origin} failed: {detail}")]
    Generator { origin: String, detail: String },
}

impl ExtractionError {
    /// The resume origin (or `"job description"`) the failure belongs to.
    #[must_use]
    pub fn origin(&self) -> &str {
        match self {
            Self::Malformed { origin, .. }
            | Self::MissingField { origin, .. }
            | Self::InvalidField { origin, .. }
            | Self::Generator { origin, .. } => origin,
        }
    }
}

/// The vector similarity service failed. Always fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexServiceError {
    #[error("vector index service unreachable: {0}")]
    Unreachable(String),

    #[error("rebuild of index `{index}` failed: {detail}")]
    Rebuild { index: String, detail: String },

    #[error("query against index `{index}` failed: {detail}")]
    Query { index: String, detail: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Configuration could not be loaded or is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {detail}")]
    Read { path: String, detail: String },

    #[error("failed to parse {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),
}

/// Top-level error for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    IndexService(#[from] IndexServiceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl MatchError {
    /// Stable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Input(InputError::MissingJobDescription) => ErrorCode::MissingJobDescription,
            Self::Input(InputError::NoResumes) => ErrorCode::NoResumes,
            Self::Extraction(ExtractionError::Malformed { .. } | ExtractionError::InvalidField { .. }) => {
                ErrorCode::MalformedExtraction
            }
            Self::Extraction(ExtractionError::MissingField { .. }) => {
                ErrorCode::MissingExtractionField
            }
            Self::Extraction(ExtractionError::Generator { .. }) => ErrorCode::GeneratorUnavailable,
            Self::IndexService(IndexServiceError::Unreachable(_)) => {
                ErrorCode::IndexServiceUnreachable
            }
            Self::IndexService(IndexServiceError::Rebuild { .. }) => ErrorCode::IndexRebuildFailed,
            Self::IndexService(IndexServiceError::Query { .. }) => ErrorCode::IndexQueryFailed,
            Self::IndexService(IndexServiceError::DimensionMismatch { .. }) => {
                ErrorCode::EmbeddingDimensionMismatch
            }
            Self::Config(ConfigError::MissingCredential(_)) => ErrorCode::MissingCredential,
            Self::Config(_) => ErrorCode::ConfigParseError,
        }
    }
}
