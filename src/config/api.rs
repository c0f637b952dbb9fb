use serde::{Deserialize, Serialize};
use url::Url;

/// Settings for [`crate::client::ApiClient`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the worldforge HTTP server.
    /// TOML: `api.base_url`. Default: `http://127.0.0.1:3001`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Whole-request timeout in seconds.
    /// TOML: `api.timeout_secs`. Default: `30`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("http://127.0.0.1:3001").expect("valid default api base url")
}

fn default_timeout_secs() -> u64 {
    30
}
