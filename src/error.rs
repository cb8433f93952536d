use std::path::PathBuf;

use thiserror::Error;

use crate::http::client::TransportError;

/// Problems that stop a run before any case is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("input_list has {inputs} labels but output_list has {outputs}")]
    LabelCountMismatch { inputs: usize, outputs: usize },
    #[error("bearer token is missing; set BEARER_TOKEN in the environment or .env file")]
    MissingCredential,
    #[error("failed to read test suite `{path}`: {source}")]
    SuiteRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse test suite `{path}`: {source}")]
    SuiteParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid capture window {min}..={max}: need 1 <= min <= max")]
    InvalidCaptureWindow { min: usize, max: usize },
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}
