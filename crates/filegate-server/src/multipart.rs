//! Multipart form decoding into in-memory files

use crate::ApiError;
use axum::extract::Multipart;
use bytes::Bytes;
use filegate_store::DEFAULT_CONTENT_TYPE;

/// A file part decoded from a multipart body, held in memory for one request
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// File name as sent by the client; used as the object key
    pub original_name: String,
    /// Declared or guessed mime type
    pub mime_type: String,
    /// File content
    pub content: Bytes,
}

impl UploadedFile {
    /// Size in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Check if the file is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Decode every file part sent under `field_name`.
///
/// Text fields are skipped. A file part under any other field name, or more
/// than `max_files` parts, is rejected as a bad request.
pub async fn collect_files(
    multipart: &mut Multipart,
    field_name: &str,
    max_files: usize,
) -> Result<Vec<UploadedFile>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        // Parts without a file name are plain form fields; browsers send an
        // empty file name when no file was picked
        let file_name = match field.file_name() {
            Some(f) if !f.is_empty() => f.to_string(),
            _ => {
                tracing::debug!(field = %name, "Skipping non-file field");
                continue;
            }
        };

        if name != field_name {
            return Err(ApiError::BadRequest(format!("Unexpected field: {}", name)));
        }

        if files.len() >= max_files {
            return Err(ApiError::BadRequest("Too many files uploaded".to_string()));
        }

        let mime_type = detect_mime_type(&file_name, field.content_type());
        let content = field.bytes().await?;

        tracing::debug!(
            file_name = %file_name,
            mime_type = %mime_type,
            size = content.len(),
            "Decoded file part"
        );

        files.push(UploadedFile {
            original_name: file_name,
            mime_type,
            content,
        });
    }

    Ok(files)
}

/// Prefer the part's declared type, then a guess from the extension
pub fn detect_mime_type(file_name: &str, declared: Option<&str>) -> String {
    match declared.map(str::trim).filter(|ct| !ct.is_empty()) {
        Some(ct) => ct.to_string(),
        None => mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("photo.png", Some("image/png"), "image/png")]
    #[case("photo.png", None, "image/png")]
    #[case("notes.txt", Some(""), "text/plain")]
    #[case("report.pdf", Some("application/x-custom"), "application/x-custom")]
    #[case("README", None, "application/octet-stream")]
    fn test_detect_mime_type(
        #[case] file_name: &str,
        #[case] declared: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(detect_mime_type(file_name, declared), expected);
    }

    #[test]
    fn test_uploaded_file_len() {
        let file = UploadedFile {
            original_name: "a.txt".to_string(),
            mime_type: "text/plain".to_string(),
            content: Bytes::from_static(b"abc"),
        };
        assert_eq!(file.len(), 3);
        assert!(!file.is_empty());
    }
}
