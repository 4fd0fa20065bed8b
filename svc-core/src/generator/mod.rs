//! SVC Generator - monolithic catalog to independent criteria
//!
//! # Pipeline
//!
//! ```text
//! catalog.json ──parse──▶ flatten() ──▶ Materializer ──▶ synthesize_index()
//!                            │              │
//!                            │              ├── {criteria_path}/{slug}/{version}/index.{json,html}
//!                            │              └── {catalog_path}/{slug}/{version}/index.{json,html}
//!                            └── ResourceMapping (dropped after materialization)
//! ```
//!
//! Generation is single pass and synchronous. The first filesystem error
//! aborts the run; artifacts already written stay on disk.

mod index;
mod materialize;

pub use index::{count_criteria, scan_catalogs, synthesize_index, CatalogSummary, IndexSummary};
pub use materialize::{Materializer, ResourceKind};

use serde_json::{Map, Value};
use std::fs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::catalog::{parse_catalog, FlattenedCatalog, Flattener};
use crate::config::GeneratorConfig;
use crate::error::{Result, SvcError};
use crate::layout::resource_dir;
use crate::render::{HtmlRenderer, Renderer};

/// Outcome of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Identifiers of every materialized criterion, in identifier order
    pub criteria: Vec<String>,
    /// Identifier of the rewritten catalog
    pub catalog: String,
    /// Base URL identifiers were minted under
    pub base_url: String,
}

/// Drives flattening, materialization, and index synthesis
pub struct Generator<R: Renderer = HtmlRenderer> {
    config: GeneratorConfig,
    renderer: R,
}

impl Generator<HtmlRenderer> {
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_renderer(config, HtmlRenderer)
    }
}

impl<R: Renderer> Generator<R> {
    pub fn with_renderer(config: GeneratorConfig, renderer: R) -> Self {
        Self { config, renderer }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Read a catalog file and generate the full resource tree from it
    pub fn generate_from_catalog(&self, catalog_path: &Path) -> Result<GenerationReport> {
        let content = fs::read_to_string(catalog_path).map_err(|source| SvcError::CatalogRead {
            path: catalog_path.to_path_buf(),
            source,
        })?;
        let catalog = parse_catalog(&content)?;
        self.generate(&catalog)
    }

    /// Generate the full resource tree from an already parsed catalog
    pub fn generate(&self, catalog: &Map<String, Value>) -> Result<GenerationReport> {
        let output_dir = self.config.output_dir.as_path();

        let flattener = Flattener {
            base_url: self.config.base_url.clone(),
            criteria_path: self.config.criteria_path.clone(),
            catalog_path: self.config.catalog_path.clone(),
        };
        let flattened = flattener.flatten(catalog)?;
        check_directories(output_dir, &flattened)?;

        for dir in [
            output_dir.to_path_buf(),
            output_dir.join(&self.config.criteria_path),
            output_dir.join(&self.config.catalog_path),
        ] {
            fs::create_dir_all(&dir).map_err(|source| SvcError::Filesystem {
                identifier: flattened.root_id().to_string(),
                path: dir.clone(),
                source,
            })?;
        }

        let materializer = Materializer::new(output_dir, &self.renderer);
        for (identifier, resource) in &flattened.resources {
            materializer.materialize(resource, ResourceKind::Criterion)?;
            info!("Generated criterion: {}", identifier);
        }

        materializer.materialize(&flattened.root, ResourceKind::Catalog)?;
        info!("Generated catalog: {}", flattened.root_id());

        synthesize_index(
            output_dir,
            &self.config.catalog_path,
            &self.config.criteria_path,
            &self.renderer,
        )?;

        info!(
            "Generated {} criteria and updated catalog",
            flattened.resources.len()
        );

        Ok(GenerationReport {
            criteria: flattened.resources.keys().cloned().collect(),
            catalog: flattened.root_id().to_string(),
            base_url: flattened.base_url.clone(),
        })
    }
}

/// Map every identifier to its output directory before anything is written.
///
/// Distinct identifiers must not share a directory, otherwise the later
/// artifact would silently replace the earlier one.
fn check_directories(output_dir: &Path, flattened: &FlattenedCatalog) -> Result<()> {
    let mut claimed: BTreeMap<PathBuf, &str> = BTreeMap::new();
    let identifiers = flattened
        .resources
        .keys()
        .map(String::as_str)
        .chain(std::iter::once(flattened.root_id()));

    for identifier in identifiers {
        let dir = resource_dir(output_dir, identifier)?;
        if let Some(existing) = claimed.insert(dir.clone(), identifier) {
            return Err(SvcError::malformed(format!(
                "{existing} and {identifier} both map to {}",
                dir.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResourceMapping;
    use serde_json::json;

    fn flattened(ids: &[&str], root: &str) -> FlattenedCatalog {
        let mut resources = ResourceMapping::new();
        for id in ids {
            let resource = json!({"id": id});
            if let Value::Object(map) = resource {
                resources.insert(id.to_string(), map);
            }
        }
        let mut root_map = Map::new();
        root_map.insert("id".to_string(), json!(root));
        FlattenedCatalog {
            root: root_map,
            resources,
            base_url: "https://x.org".to_string(),
        }
    }

    #[test]
    fn test_check_directories_accepts_distinct_paths() {
        let catalog = flattened(
            &["https://x.org/criteria/a/1/", "https://x.org/criteria/b/1/"],
            "https://x.org/vocabulary/s/1/",
        );
        assert!(check_directories(Path::new("out"), &catalog).is_ok());
    }

    #[test]
    fn test_check_directories_rejects_shared_directory() {
        // Trailing slash differs, directory does not
        let catalog = flattened(
            &["https://x.org/criteria/a/1", "https://x.org/criteria/a/1/"],
            "https://x.org/vocabulary/s/1/",
        );
        let err = check_directories(Path::new("out"), &catalog).unwrap_err();
        assert!(matches!(err, SvcError::MalformedInput(_)));
        assert!(err.to_string().contains("criteria/a/1"));
    }

    #[test]
    fn test_check_directories_includes_catalog_root() {
        // Same prefix for criteria and catalogs
        let catalog = flattened(&["https://x.org/shared/s/1/"], "https://x.org/shared/s/1");
        assert!(check_directories(Path::new("out"), &catalog).is_err());
    }
}
