//! Seam between the domain and the generative-AI provider.
//!
//! `ehon-openai` implements [`GenerativeUpstream`] against the real service;
//! tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::Photo;

/// A single-prompt text completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A single-image generation request conditioned on an uploaded photo.
#[derive(Debug, Clone)]
pub struct IllustrationRequest {
    pub prompt: String,
    pub photo: Photo,
}

#[async_trait]
pub trait GenerativeUpstream: Send + Sync {
    /// Return the raw text of the first completion choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CoreError>;

    /// Return the URL (remote or `data:`) of the first generated image.
    async fn illustrate(&self, request: &IllustrationRequest) -> Result<String, CoreError>;
}
