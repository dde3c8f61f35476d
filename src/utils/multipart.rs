use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A multipart body split into text fields and file parts.
#[derive(Debug, Default)]
pub struct FormParts {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl FormParts {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut parts = FormParts::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;

                // Browsers send an empty part for an untouched file input.
                if bytes.is_empty() {
                    continue;
                }

                parts.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                );
            } else {
                let value = field.text().await?;
                parts.fields.insert(name, value);
            }
        }

        Ok(parts)
    }

    /// Non-blank text value of a field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && *v != "null" && *v != "undefined")
            .map(str::to_string)
    }

    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.text(name)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| AppError::BadRequest(format!("Invalid value for {}", name)))
            })
            .transpose()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
