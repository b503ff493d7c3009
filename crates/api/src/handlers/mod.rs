pub mod compositing;
pub mod form;
pub mod generation;
pub mod stories;

use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Parse a JSON request body. Any syntax or shape error is a 400 with the
/// fixed message `Invalid JSON`.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        AppError::BadRequest("Invalid JSON".to_string())
    })
}
