use thiserror::Error;

/// Failures talking to the remote catalog API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} is not valid JSON for the expected shape: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::InvalidBaseUrl { .. } => "config",
            ClientError::Transport { .. } => "transport",
            ClientError::Status { .. } => "status",
            ClientError::Decode { .. } => "decode",
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
