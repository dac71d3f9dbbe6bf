use axum::extract::{multipart::MultipartError, Multipart};
use axum::http::StatusCode;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::services::storage::UploadedFile;

/// A multipart body read fully into memory: text fields plus file parts
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

fn rejection(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Uploaded file is too large")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart, max_bytes: usize) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();
        let mut total = 0usize;

        while let Some(field) = multipart.next_field().await.map_err(rejection)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(rejection)?;

            total += bytes.len();
            if total > max_bytes {
                return Err(ApiError::payload_too_large("Uploaded file is too large"));
            }

            match file_name {
                Some(file_name) => {
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let text = String::from_utf8(bytes.to_vec())
                        .map_err(|_| ApiError::invalid_field(&name, "must be valid UTF-8 text"))?;
                    form.fields.entry(name).or_default().push(text);
                }
            }
        }

        Ok(form)
    }

    /// First value of a text field, trimmed; blank counts as absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Every value sent under `name` or `name[]`, with comma-separated
    /// values split apart
    pub fn all(&self, name: &str) -> Vec<String> {
        let bracketed = format!("{}[]", name);
        [name, bracketed.as_str()]
            .iter()
            .filter_map(|key| self.fields.get(*key))
            .flatten()
            .flat_map(|value| value.split(','))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.bytes.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn with_fields(pairs: &[(&str, &str)]) -> Self {
        let mut form = MultipartForm::default();
        for (k, v) in pairs {
            form.fields.entry(k.to_string()).or_default().push(v.to_string());
        }
        form
    }
}
