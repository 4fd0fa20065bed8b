//! Content negotiation against the generated resource tree
//!
//! Resolution order for a request path:
//!
//! 1. A directory holding `index.json` and/or `index.html` is negotiated
//!    from the Accept header. The chosen artifact is served only if it
//!    exists; there is no substitution.
//! 2. A plain file is served with a media type derived from its extension.
//! 3. A directory with `index.html` serves that page.
//! 4. Anything else is not found.
//!
//! The filesystem is re-read for every request.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SvcError};
use crate::layout::{
    media_type_for, DATA_ARTIFACT, DOCUMENT_ARTIFACT, HTML_MEDIA_TYPE, JSON_MEDIA_TYPE,
};

/// Accept value assumed when a request carries none
pub const DEFAULT_ACCEPT: &str = "*/*";
const WILDCARD: &str = "*/*";
/// Agent signature of interactive browsers
const BROWSER_SIGNATURE: &str = "Mozilla";

/// One of the two representations of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Data,
    Document,
}

impl Artifact {
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Data => DATA_ARTIFACT,
            Artifact::Document => DOCUMENT_ARTIFACT,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Artifact::Data => JSON_MEDIA_TYPE,
            Artifact::Document => HTML_MEDIA_TYPE,
        }
    }
}

/// Bytes to send and how to label them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Terminal outcome of a resolution. Server errors are the `Err` side of
/// [`Resolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Negotiated structured-data artifact
    Data(Served),
    /// Negotiated rendered-document artifact
    Document(Served),
    /// Direct file or directory default page
    Static(Served),
    NotFound,
}

/// What the client said it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preference {
    pub accepts_data: bool,
    pub accepts_document: bool,
    pub is_browser: bool,
}

impl Preference {
    /// Derive preferences from raw `Accept` and `User-Agent` values.
    ///
    /// A media type is accepted when the Accept value contains it verbatim or
    /// contains `*/*`. A missing Accept header counts as `*/*`.
    pub fn from_headers(accept: Option<&str>, user_agent: Option<&str>) -> Self {
        let accept = accept.unwrap_or(DEFAULT_ACCEPT);
        Self {
            accepts_data: accepts(accept, JSON_MEDIA_TYPE),
            accepts_document: accepts(accept, HTML_MEDIA_TYPE),
            is_browser: user_agent.is_some_and(|ua| ua.contains(BROWSER_SIGNATURE)),
        }
    }

    /// Pick the artifact to serve from a directory, or `None` to fall through
    /// to static serving.
    pub fn choose(&self, has_data: bool, has_document: bool) -> Option<Artifact> {
        let preferred = match (self.accepts_data, self.accepts_document) {
            (true, true) if self.is_browser => Artifact::Document,
            (true, true) => Artifact::Data,
            (true, false) => Artifact::Data,
            (false, true) => Artifact::Document,
            (false, false) if has_data => Artifact::Data,
            (false, false) => Artifact::Document,
        };

        let present = match preferred {
            Artifact::Data => has_data,
            Artifact::Document => has_document,
        };
        present.then_some(preferred)
    }
}

/// Whether `accept` admits `media_type`
pub fn accepts(accept: &str, media_type: &str) -> bool {
    accept.contains(media_type) || accept.contains(WILDCARD)
}

/// Resolves request paths against a served root directory
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `request_path` for a client with the given preference.
    ///
    /// Errors are failures after a resource was located (for example a file
    /// removed between the existence check and the read).
    pub fn resolve(&self, request_path: &str, preference: &Preference) -> Result<Outcome> {
        let Some(location) = self.locate(request_path) else {
            debug!(request_path, "rejected path outside the served root");
            return Ok(Outcome::NotFound);
        };

        if location.is_dir() {
            let data = location.join(DATA_ARTIFACT);
            let document = location.join(DOCUMENT_ARTIFACT);
            let has_data = data.is_file();
            let has_document = document.is_file();

            if has_data || has_document {
                if let Some(artifact) = preference.choose(has_data, has_document) {
                    let served = read_served(
                        location.join(artifact.file_name()),
                        artifact.media_type(),
                    )?;
                    return Ok(match artifact {
                        Artifact::Data => Outcome::Data(served),
                        Artifact::Document => Outcome::Document(served),
                    });
                }
            }

            if has_document {
                return Ok(Outcome::Static(read_served(document, HTML_MEDIA_TYPE)?));
            }
            return Ok(Outcome::NotFound);
        }

        if location.is_file() {
            let content_type = media_type_for(&location);
            return Ok(Outcome::Static(read_served(location, content_type)?));
        }

        Ok(Outcome::NotFound)
    }

    /// Map a URL path onto the served root; `None` when it would escape it
    fn locate(&self, request_path: &str) -> Option<PathBuf> {
        let mut location = self.root.clone();
        for component in Path::new(request_path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(segment) => location.push(segment),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(location)
    }
}

fn read_served(path: PathBuf, content_type: &'static str) -> Result<Served> {
    let body = fs::read(&path).map_err(|source| SvcError::Resolution {
        path: path.clone(),
        source,
    })?;
    Ok(Served {
        path,
        content_type,
        body,
    })
}
