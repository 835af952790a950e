use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload returned by the API for non-2xx responses
#[derive(Error, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[error("Symbiosis: {message} (type={error_type}, path={path})")]
pub struct ApiError {
    #[serde(default)]
    pub status: u16,

    /// Short machine-readable tag
    #[serde(rename = "error", default)]
    pub error_type: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub path: String,
}
