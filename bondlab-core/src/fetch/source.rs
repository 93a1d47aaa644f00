//! Source trait and structured fetch errors.
//!
//! The JsonSource trait abstracts the HTTP transport so the pagination and
//! orchestration layers can be driven by scripted responses in tests.

use serde_json::Value;
use thiserror::Error;

/// Query string parameters, in request order.
pub type Query = Vec<(String, String)>;

/// Structured error types for a single API request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("response body is not valid JSON: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) => false,
        }
    }
}

/// Anything that can answer a GET with a JSON document.
pub trait JsonSource {
    /// Fetch `url` with the given query parameters and parse the body.
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, FetchError>;
}

impl<T: JsonSource + ?Sized> JsonSource for &T {
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, FetchError> {
        (**self).get_json(url, query)
    }
}
