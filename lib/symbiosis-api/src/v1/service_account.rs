use serde::{Deserialize, Serialize};
use std::fmt;

/// Cluster service account bound to the calling user
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub id: String,

    #[serde(default)]
    pub service_account_token: String,

    #[serde(default)]
    pub cluster_certificate_authority: String,

    #[serde(default)]
    pub kube_config: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("id", &self.id)
            .field("service_account_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}
