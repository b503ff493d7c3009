//! Resolve an image source (data URL, object URL or remote URL) to a
//! decoded image. Every failure surfaces as [`CoreError::Decode`].

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::DynamicImage;

use super::object_url::{ObjectUrlRegistry, OBJECT_URL_PREFIX};
use crate::error::CoreError;

/// Fetches remote image bytes. Implementations must not attach cookies or
/// credentials to the request.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError>;
}

/// A parsed image source.
#[derive(Debug, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Payload of a base64 `data:` URL, already decoded.
    Data(Vec<u8>),
    /// A `blob:` URL minted by [`ObjectUrlRegistry`].
    Object(&'a str),
    /// An `http` or `https` URL.
    Remote(&'a str),
}

impl<'a> ImageSource<'a> {
    pub fn parse(source: &'a str) -> Result<Self, CoreError> {
        let source = source.trim();
        if let Some(rest) = source.strip_prefix("data:") {
            return decode_data_url(rest).map(ImageSource::Data);
        }
        if source.starts_with(OBJECT_URL_PREFIX) {
            return Ok(ImageSource::Object(source));
        }
        if source.starts_with("http://") || source.starts_with("https://") {
            return Ok(ImageSource::Remote(source));
        }
        Err(CoreError::Decode(format!(
            "Unsupported image source: {}",
            truncate_for_log(source)
        )))
    }
}

/// Decode the part of a data URL after `data:`.
fn decode_data_url(rest: &str) -> Result<Vec<u8>, CoreError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::Decode("Malformed data URL".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(CoreError::Decode(
            "Only base64 data URLs are supported".to_string(),
        ));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| CoreError::Decode(format!("Invalid base64 payload: {e}")))
}

fn truncate_for_log(source: &str) -> String {
    const MAX: usize = 64;
    match source.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &source[..idx]),
        None => source.to_string(),
    }
}

/// Decode encoded image bytes (PNG, JPEG or WebP).
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Decode("Image data is empty".to_string()));
    }
    image::load_from_memory(bytes)
        .map_err(|e| CoreError::Decode(format!("Unsupported or corrupt image: {e}")))
}

/// Loads images from any [`ImageSource`].
#[derive(Clone)]
pub struct ImageLoader {
    registry: Arc<ObjectUrlRegistry>,
    fetcher: Option<Arc<dyn ImageFetcher>>,
}

impl ImageLoader {
    /// A loader that can only read `data:` and `blob:` sources.
    pub fn local(registry: Arc<ObjectUrlRegistry>) -> Self {
        Self {
            registry,
            fetcher: None,
        }
    }

    pub fn with_fetcher(registry: Arc<ObjectUrlRegistry>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            registry,
            fetcher: Some(fetcher),
        }
    }

    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    /// Fetch the raw encoded bytes for `source` without decoding them.
    pub async fn load_bytes(&self, source: &str) -> Result<Arc<[u8]>, CoreError> {
        match ImageSource::parse(source)? {
            ImageSource::Data(bytes) => Ok(bytes.into()),
            ImageSource::Object(url) => self
                .registry
                .resolve(url)
                .ok_or_else(|| CoreError::Decode(format!("Object URL {url} is not live"))),
            ImageSource::Remote(url) => {
                let fetcher = self.fetcher.as_ref().ok_or_else(|| {
                    CoreError::Decode("Remote image sources are not available".to_string())
                })?;
                let bytes = fetcher.fetch(url).await.map_err(|e| match e {
                    CoreError::Decode(msg) => CoreError::Decode(msg),
                    other => CoreError::Decode(format!("Failed to load {url}: {other}")),
                })?;
                Ok(bytes.into())
            }
        }
    }

    /// Load and decode `source`.
    pub async fn load_image(&self, source: &str) -> Result<DynamicImage, CoreError> {
        let bytes = self.load_bytes(source).await?;
        decode_image(&bytes)
    }
}
