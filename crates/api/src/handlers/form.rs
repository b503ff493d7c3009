//! Multipart upload parsing shared by the upload endpoints.

use std::collections::HashMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use ehon_core::types::Photo;

use crate::error::{AppError, AppResult};

/// Name of the multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";

/// A parsed multipart form: the photo (if one was sent) and every text
/// field by name.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub photo: Option<Photo>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain `multipart`. A missing or malformed multipart body is a 400 and
    /// a body over the upload limit is a 413, both as JSON errors.
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> AppResult<Self> {
        let mut multipart = multipart?;
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(AppError::from)?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(AppError::from)?;
                if !data.is_empty() {
                    form.photo = Some(Photo::new(data.to_vec(), file_name, content_type));
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(AppError::from)?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// Text field `name`, trimmed; `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
