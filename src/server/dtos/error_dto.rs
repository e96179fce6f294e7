use serde::{Deserialize, Serialize};

/// `{ "error": "..." }`, the only error body clients ever see
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
