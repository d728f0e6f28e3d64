//! Document Encoder: turns an uploaded file into base64 text plus a media type.
//!
//! Encoding is byte-exact: `decode_document(encode_document(d))` returns the
//! original bytes. No size limit is enforced here; the model provider rejects
//! whatever it considers too large.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use tracing::warn;

use crate::analysis::AnalysisError;

pub const PDF: &str = "application/pdf";
pub const DOC: &str = "application/msword";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Media types the upload form advertises. Advisory only.
pub const ACCEPTED_MEDIA_TYPES: &[&str] = &[PDF, DOC, DOCX];

/// Content of an upload: either fully read, or the reason reading stopped.
#[derive(Debug, Clone)]
pub enum DocumentBody {
    Loaded(Bytes),
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub media_type: String,
    pub body: DocumentBody,
}

impl Document {
    /// Builds a loaded document. A missing or blank declared media type is
    /// replaced by a guess from the file extension.
    pub fn new(file_name: impl Into<String>, media_type: Option<&str>, bytes: Bytes) -> Self {
        let file_name = file_name.into();
        let media_type = resolve_media_type(&file_name, media_type);
        Self {
            file_name,
            media_type,
            body: DocumentBody::Loaded(bytes),
        }
    }

    /// A document whose upload could not be read to the end.
    pub fn unreadable(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let media_type = resolve_media_type(&file_name, None);
        Self {
            file_name,
            media_type,
            body: DocumentBody::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_accepted_type(&self) -> bool {
        ACCEPTED_MEDIA_TYPES.contains(&self.media_type.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDocument {
    pub file_name: String,
    pub media_type: String,
    /// Standard base64 with padding.
    pub data: String,
}

pub fn encode_document(document: &Document) -> Result<EncodedDocument, AnalysisError> {
    let bytes = match &document.body {
        DocumentBody::Loaded(bytes) => bytes,
        DocumentBody::Failed { reason } => {
            return Err(AnalysisError::ReadFailure {
                file_name: document.file_name.clone(),
                reason: reason.clone(),
            })
        }
    };

    if !document.is_accepted_type() {
        warn!(
            "Forwarding '{}' with non-résumé media type {}",
            document.file_name, document.media_type
        );
    }

    Ok(EncodedDocument {
        file_name: document.file_name.clone(),
        media_type: document.media_type.clone(),
        data: BASE64.encode(bytes),
    })
}

/// Inverse of `encode_document`, used to check the encoding is lossless.
#[cfg(test)]
pub fn decode_document(encoded: &EncodedDocument) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(&encoded.data)
}

fn resolve_media_type(file_name: &str, declared: Option<&str>) -> String {
    match declared.map(str::trim).filter(|m| !m.is_empty()) {
        Some(declared) => declared.to_string(),
        None => guess_media_type(file_name).to_string(),
    }
}

/// Guesses the media type from the file extension.
pub fn guess_media_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => PDF,
        Some("doc") => DOC,
        Some("docx") => DOCX,
        _ => OCTET_STREAM,
    }
}
