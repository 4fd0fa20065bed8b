//! Writing resources to disk as a JSON/HTML artifact pair

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::catalog::ID_FIELD;
use crate::error::{Result, SvcError};
use crate::layout::{resource_dir, DATA_ARTIFACT, DOCUMENT_ARTIFACT};
use crate::render::Renderer;

/// Which page template a resource is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Criterion,
    Catalog,
}

/// Persists resources under an output root
pub struct Materializer<'a, R: Renderer> {
    output_dir: &'a Path,
    renderer: &'a R,
}

impl<'a, R: Renderer> Materializer<'a, R> {
    pub fn new(output_dir: &'a Path, renderer: &'a R) -> Self {
        Self {
            output_dir,
            renderer,
        }
    }

    /// Write `index.json` and `index.html` for `resource` into the directory
    /// derived from its identifier, returning that directory.
    ///
    /// Both artifacts are overwritten in full. A failure between the two
    /// writes leaves the HTML twin stale.
    pub fn materialize(&self, resource: &Map<String, Value>, kind: ResourceKind) -> Result<PathBuf> {
        let identifier = resource
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| SvcError::malformed("resource has no identifier to materialize"))?;
        let dir = resource_dir(self.output_dir, identifier)?;

        fs::create_dir_all(&dir).map_err(|source| SvcError::Filesystem {
            identifier: identifier.to_string(),
            path: dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(resource)?;
        write_artifact(identifier, &dir.join(DATA_ARTIFACT), json.as_bytes())?;

        let html = match kind {
            ResourceKind::Criterion => self.renderer.render_criterion(resource),
            ResourceKind::Catalog => self.renderer.render_catalog(resource),
        };
        write_artifact(identifier, &dir.join(DOCUMENT_ARTIFACT), html.as_bytes())?;

        debug!(%identifier, dir = %dir.display(), "materialized resource");
        Ok(dir)
    }
}

fn write_artifact(identifier: &str, path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| SvcError::Filesystem {
        identifier: identifier.to_string(),
        path: path.to_path_buf(),
        source,
    })
}
