use std::sync::Arc;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// An uploaded photo.
///
/// The bytes sit behind an `Arc` so one upload can be handed to every
/// per-scene generation call without copying.
#[derive(Debug, Clone)]
pub struct Photo {
    pub bytes: Arc<[u8]>,
    pub file_name: String,
    pub content_type: String,
}

/// Fallback name when the upload carried no file name.
pub const DEFAULT_PHOTO_NAME: &str = "photo.png";

/// Fallback MIME type when the upload carried no content type.
pub const DEFAULT_PHOTO_CONTENT_TYPE: &str = "image/png";

impl Photo {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        file_name: Option<String>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_PHOTO_NAME.to_string()),
            content_type: content_type
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_PHOTO_CONTENT_TYPE.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
