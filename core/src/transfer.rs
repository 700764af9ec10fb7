//! Binary attachments and the multipart encoding used for uploads.

use std::io::Cursor;

use common_multipart_rfc7578::client::multipart::{Body, Form};
use futures::executor::block_on;
use futures::TryStreamExt;
use mime::Mime;

use crate::error::ApiError;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A file exchanged with the host: uploaded from an input item or attached
/// to an output item after a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryData {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    pub mime_type: String,
}

impl BinaryData {
    pub fn new(data: Vec<u8>, file_name: Option<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            file_name,
            mime_type: mime_type.into(),
        }
    }
}

/// Raw bytes returned by a download, with the content type the API reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// A `multipart/form-data` body with a single `file` part.
#[derive(Debug, Clone)]
pub struct MultipartFile {
    /// `multipart/form-data` with the generated boundary.
    pub content_type: String,
    pub body: Vec<u8>,
}

impl MultipartFile {
    /// Encodes `data` under the form field `file`. An empty `mime_type`
    /// falls back to [`DEFAULT_MIME_TYPE`]; anything that does not parse as
    /// a MIME type is rejected.
    pub fn encode(file_name: &str, mime_type: &str, data: &[u8]) -> Result<Self, ApiError> {
        let mime = parse_mime(mime_type)?;
        let file_name = file_name.replace(['"', '\r', '\n'], "_");

        let mut form = Form::default();
        form.add_reader_file_with_mime("file", Cursor::new(data.to_vec()), file_name, mime);
        let content_type = form.content_type();

        let body = block_on(Body::from(form).try_fold(
            Vec::with_capacity(data.len() + 256),
            |mut body, chunk| async move {
                body.extend_from_slice(&chunk);
                Ok(body)
            },
        ))
        .map_err(|e| ApiError::Serialization(e.to_string()))?;

        Ok(Self { content_type, body })
    }
}

fn parse_mime(mime_type: &str) -> Result<Mime, ApiError> {
    let mime_type = mime_type.trim();
    if mime_type.is_empty() {
        return Ok(mime::APPLICATION_OCTET_STREAM);
    }
    mime_type
        .parse()
        .map_err(|_| ApiError::invalid("mimeType", format!("{mime_type:?} is not a MIME type")))
}
