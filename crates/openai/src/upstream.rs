//! [`GenerativeUpstream`] backed by [`OpenAiApi`].

use async_trait::async_trait;
use ehon_core::error::CoreError;
use ehon_core::upstream::{CompletionRequest, GenerativeUpstream, IllustrationRequest};

use crate::api::{ImageUpload, OpenAiApi, OpenAiApiError};

impl From<OpenAiApiError> for CoreError {
    fn from(err: OpenAiApiError) -> Self {
        match err {
            OpenAiApiError::Request(e) => CoreError::Network(e.to_string()),
            OpenAiApiError::ApiError { status, message } => CoreError::Upstream {
                status: Some(status),
                message,
            },
            OpenAiApiError::MissingOutput(message) => CoreError::upstream(message),
            OpenAiApiError::InvalidUpload(message) => CoreError::Validation(message),
        }
    }
}

#[async_trait]
impl GenerativeUpstream for OpenAiApi {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CoreError> {
        tracing::debug!(
            model = %self.config().chat_model,
            max_tokens = request.max_tokens,
            "Requesting chat completion",
        );
        self.chat_completion(&request.prompt, request.temperature, request.max_tokens)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Chat completion failed");
                CoreError::from(e)
            })
    }

    async fn illustrate(&self, request: &IllustrationRequest) -> Result<String, CoreError> {
        let photo = &request.photo;
        tracing::debug!(
            model = %self.config().image_model,
            photo_bytes = photo.bytes.len(),
            "Requesting image edit",
        );
        let upload = ImageUpload {
            bytes: &photo.bytes,
            file_name: &photo.file_name,
            content_type: &photo.content_type,
        };
        self.edit_image(&request.prompt, upload).await.map_err(|e| {
            tracing::error!(error = %e, "Image edit failed");
            CoreError::from(e)
        })
    }
}
