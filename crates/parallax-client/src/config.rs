//! Blob-transfer HTTP configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientResult;

/// Settings for the HTTP client used to move blob payloads.
///
/// Protocol constants (inline threshold, poll window, retry budget) are
/// fixed by the backend protocol and are deliberately not configurable.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Overall timeout for one upload or download request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Connection establishment timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl HttpConfig {
    /// Builds the reqwest client used for blob transfer.
    pub fn build_http_client(&self) -> ClientResult<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .build()?)
    }
}
