//! Buffered multipart form reading
//!
//! Uploads are small enough to hold in memory, so every part is read up
//! front and handlers pick what they need by field name.

use axum::extract::{multipart::MultipartError, Multipart};
use std::collections::HashMap;

/// A file part of a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    files: HashMap<String, UploadedFile>,
    text: HashMap<String, String>,
}

impl MultipartForm {
    /// Drain `multipart`. Parts carrying a file name are files, the rest
    /// are text. Later parts with the same name replace earlier ones.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            match file_name {
                Some(file_name) => {
                    let data = field.bytes().await?.to_vec();
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            data,
                        },
                    );
                },
                None => {
                    let value = field.text().await?;
                    form.text.insert(name, value);
                },
            }
        }

        Ok(form)
    }

    /// Remove and return the first file found under any of `names`
    pub fn take_file(&mut self, names: &[&str]) -> Option<UploadedFile> {
        names.iter().find_map(|name| self.files.remove(*name))
    }

    /// Text value of `name`, if sent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        files: Vec<(&str, UploadedFile)>,
        text: Vec<(&str, &str)>,
    ) -> Self {
        Self {
            files: files.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            text: text
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
