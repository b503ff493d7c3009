//! REST client for the OpenAI HTTP endpoints.
//!
//! Wraps chat completions (scene summaries) and image edits (scene
//! illustrations conditioned on an uploaded photo) using [`reqwest`].

use serde::{Deserialize, Serialize};

/// Default API root, without a trailing slash.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for scene summaries.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Default model for scene illustrations.
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

/// Connection settings for one OpenAI account.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
}

impl OpenAiConfig {
    /// Settings with the default endpoint and models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

/// HTTP client for the OpenAI API.
pub struct OpenAiApi {
    client: reqwest::Client,
    config: OpenAiConfig,
}

/// Errors from the OpenAI REST layer.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// OpenAI returned a non-2xx status code.
    #[error("OpenAI API error ({status}): {message}")]
    ApiError {
        status: u16,
        /// `error.message` from the response body, or the raw body.
        message: String,
    },

    /// A 2xx response without the expected output, including bodies that
    /// are not the expected JSON.
    #[error("OpenAI response missing output: {0}")]
    MissingOutput(String),

    /// The caller's upload cannot be sent as given.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}

// ---- wire types ----

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Photo sent as the conditioning image of an edit request.
pub struct ImageUpload<'a> {
    pub bytes: &'a [u8],
    pub file_name: &'a str,
    pub content_type: &'a str,
}

impl OpenAiApi {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Single-turn chat completion.
    ///
    /// Sends `POST /chat/completions` with one user message and returns the
    /// first choice's content, trimmed. An empty completion is returned as
    /// an empty string.
    pub async fn chat_completion(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, OpenAiApiError> {
        let body = ChatCompletionRequest {
            model: &self.config.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: ChatCompletionResponse = Self::parse_response(response).await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(content.trim().to_string())
    }

    /// Generate one image from `prompt` conditioned on `image`.
    ///
    /// Sends a multipart `POST /images/edits` with `n = 1`. Returns the
    /// first result's URL, or a PNG data URL when the model only returned
    /// base64.
    pub async fn edit_image(
        &self,
        prompt: &str,
        image: ImageUpload<'_>,
    ) -> Result<String, OpenAiApiError> {
        let part = reqwest::multipart::Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.to_string())
            .mime_str(image.content_type)
            .map_err(|_| {
                OpenAiApiError::InvalidUpload(format!(
                    "Unsupported image content type: {}",
                    image.content_type
                ))
            })?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.config.image_model.clone())
            .text("prompt", prompt.to_string())
            .text("n", "1")
            .part("image", part);

        let response = self
            .client
            .post(self.endpoint("images/edits"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let parsed: ImagesResponse = Self::parse_response(response).await?;
        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| OpenAiApiError::MissingOutput("no image data returned".into()))?;

        match (first.url, first.b64_json) {
            (Some(url), _) if !url.trim().is_empty() => Ok(url),
            (_, Some(b64)) if !b64.trim().is_empty() => {
                Ok(format!("data:image/png;base64,{}", b64.trim()))
            }
            _ => Err(OpenAiApiError::MissingOutput(
                "image result has neither url nor b64_json".into(),
            )),
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. On failure the
    /// message is `error.message` from the JSON body when present, else the
    /// raw body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, OpenAiApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OpenAiApiError::ApiError {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, OpenAiApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| OpenAiApiError::MissingOutput(format!("malformed response body: {e}")))
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.to_string(),
    }
}
