/// Failure talking to a generative or embedding model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("model response could not be decoded: {0}")]
    MalformedResponse(String),

    #[error("model returned no content")]
    EmptyResponse,
}

impl From<ureq::Error> for LlmError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                Self::Status {
                    code,
                    body: body.trim().to_string(),
                }
            }
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}
