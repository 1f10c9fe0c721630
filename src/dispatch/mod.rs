// Content dispatch for uploaded artifacts

use crate::models::gemini::InlineData;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// MIME types submitted to the model as literal text.
pub const TEXT_MIME: &str = "text/plain";
pub const EMAIL_MIME: &str = "message/rfc822";

/// Tag applied to binary content whose upload carried no MIME type.
const FALLBACK_BINARY_MIME: &str = "application/octet-stream";

/// File suffixes accepted as plain text when the upload has no MIME type.
static TEXT_SUFFIXES: phf::Set<&'static str> = phf::phf_set! {
    "txt",
    "eml",
    "log",
};

/// An uploaded file as delivered by the host environment: its name, the
/// declared MIME type, and content already decoded into either a text string
/// or a data URL. The bytes themselves are never re-read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub file_name: String,
    #[serde(default)]
    pub mime_type: String,
    pub content: ArtifactContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ArtifactContent {
    /// Decoded text, e.g. a raw email body.
    Text(String),
    /// A `data:<mime>;base64,<payload>` URL for binary files.
    DataUrl(String),
}

/// What actually goes to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisPayload {
    /// Literal decoded text, submitted unmodified.
    Text(String),
    /// Base64 payload tagged with the original MIME type.
    Inline(InlineData),
}

/// Decide how an artifact is packaged for the model.
///
/// Selection is driven solely by the declared MIME type and the file name
/// suffix; content is never sniffed. Text and email MIME types pass the
/// decoded text through literally. Everything else has exactly the data-URL
/// header stripped and is submitted as inline base64 tagged with the original
/// MIME type (or the generic binary tag when none was declared).
///
/// Returns `None` when the artifact yields nothing submittable — a text
/// artifact that arrived as a data URL, a binary artifact without one, or a
/// payload that is not base64. The caller gates submission on presence.
pub fn build_payload(artifact: &Artifact) -> Option<AnalysisPayload> {
    let mime = artifact.mime_type.trim();

    if is_text_mime(mime) || (mime.is_empty() && has_text_suffix(&artifact.file_name)) {
        return match &artifact.content {
            ArtifactContent::Text(text) => Some(AnalysisPayload::Text(text.clone())),
            ArtifactContent::DataUrl(_) => None,
        };
    }

    let data_url = match &artifact.content {
        ArtifactContent::DataUrl(url) => url,
        ArtifactContent::Text(_) => return None,
    };

    let encoded = strip_data_url_header(data_url)?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;

    let mime_type = if mime.is_empty() {
        FALLBACK_BINARY_MIME.to_string()
    } else {
        mime.to_string()
    };

    Some(AnalysisPayload::Inline(InlineData {
        mime_type,
        data: encoded.to_string(),
    }))
}

fn is_text_mime(mime: &str) -> bool {
    mime == TEXT_MIME || mime == EMAIL_MIME
}

fn has_text_suffix(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, suffix)| TEXT_SUFFIXES.contains(suffix.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Strip exactly the `data:<mime>;base64,` header from a data URL.
fn strip_data_url_header(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    Some(payload)
}
