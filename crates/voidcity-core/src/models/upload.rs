use std::path::Path;

use crate::error::CoreError;

/// An image file selected for upload alongside a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name);
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Read an image from disk.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into());
        Ok(Self::new(file_name, bytes))
    }
}

/// MIME type from the file extension, falling back to octet-stream.
fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string()
}
