//! On-disk layout shared by the generator and the server
//!
//! A resource identifier doubles as its storage location: the URL path of the
//! identifier, appended under the output root, is the directory holding the
//! resource's two artifacts. [`resource_dir`] is the only place that mapping
//! is made.

use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{Result, SvcError};

/// Structured-data artifact name
pub const DATA_ARTIFACT: &str = "index.json";
/// Rendered-document artifact name
pub const DOCUMENT_ARTIFACT: &str = "index.html";

pub const JSON_MEDIA_TYPE: &str = "application/json";
pub const HTML_MEDIA_TYPE: &str = "text/html";
pub const OCTET_STREAM_MEDIA_TYPE: &str = "application/octet-stream";

/// Directory under `output_dir` that holds the artifacts of `identifier`.
///
/// The URL path is used verbatim (no percent-decoding). Identifiers carrying a
/// query or fragment, or with `.`/`..` segments, are rejected: the first would
/// share a directory with the bare path, the second could leave `output_dir`
/// or land in another resource's area.
pub fn resource_dir(output_dir: &Path, identifier: &str) -> Result<PathBuf> {
    // Url::parse resolves dot segments, so check the raw text first
    let raw_path = identifier.split(['?', '#']).next().unwrap_or_default();
    if raw_path.split('/').any(is_dot_segment) {
        return Err(SvcError::malformed(format!(
            "identifier path of {identifier} contains a relative segment"
        )));
    }

    let url = Url::parse(identifier).map_err(|source| SvcError::InvalidUrl {
        value: identifier.to_string(),
        source,
    })?;
    if url.query().is_some() || url.fragment().is_some() {
        return Err(SvcError::malformed(format!(
            "identifier {identifier} has a query or fragment and cannot name a directory"
        )));
    }

    let mut dir = output_dir.to_path_buf();
    for segment in url.path().split('/').filter(|s| !s.is_empty()) {
        dir.push(segment);
    }
    Ok(dir)
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

/// Media type for a served file, by extension
pub fn media_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => HTML_MEDIA_TYPE,
        Some("json") => JSON_MEDIA_TYPE,
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("png") => "image/png",
        Some("jpg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => OCTET_STREAM_MEDIA_TYPE,
    }
}
