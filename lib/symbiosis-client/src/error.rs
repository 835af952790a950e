use symbiosis_api::ApiError;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response, or the body could not be read
    #[error("Transport error calling {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx body did not match the expected schema
    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The API answered with a non-2xx status other than an accepted 404
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid client configuration: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    /// HTTP status of an API-reported error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(e) => Some(e.status),
            _ => None,
        }
    }
}
