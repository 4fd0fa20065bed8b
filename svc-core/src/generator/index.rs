//! Discovery index synthesis
//!
//! Reads back the materialized tree: every directory under the catalog path
//! holding an `index.json` is one catalog, and criteria are counted as
//! `{criteria_path}/{slug}/{version}/index.json`. The summary is written to
//! the output root as `index.html` and `index.json`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::{DESCRIPTION_FIELD, ID_FIELD, NAME_FIELD, SCHEME_FIELD, VERSION_FIELD};
use crate::error::{Result, SvcError};
use crate::layout::{DATA_ARTIFACT, DOCUMENT_ARTIFACT};
use crate::render::Renderer;

/// Display metadata for one discovered catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub name: String,
    pub description: String,
    pub version: String,
    /// Directory relative to the catalog path, `/`-separated
    pub path: String,
    pub id: String,
}

/// Everything the discovery document shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub catalogs: Vec<CatalogSummary>,
    pub criteria_count: usize,
    pub catalog_path: String,
    pub criteria_path: String,
}

/// Scan the output tree, then write `index.html` and `index.json` at its root.
///
/// Catalogs that cannot be read or parsed are skipped with a warning.
pub fn synthesize_index<R: Renderer>(
    output_dir: &Path,
    catalog_path: &str,
    criteria_path: &str,
    renderer: &R,
) -> Result<IndexSummary> {
    let summary = IndexSummary {
        catalogs: scan_catalogs(&output_dir.join(catalog_path)),
        criteria_count: count_criteria(&output_dir.join(criteria_path)),
        catalog_path: catalog_path.to_string(),
        criteria_path: criteria_path.to_string(),
    };

    let html_path = output_dir.join(DOCUMENT_ARTIFACT);
    fs::write(&html_path, renderer.render_index(&summary)).map_err(|source| {
        SvcError::Filesystem {
            identifier: "index".to_string(),
            path: html_path.clone(),
            source,
        }
    })?;

    let json_path = output_dir.join(DATA_ARTIFACT);
    let json = serde_json::to_string_pretty(&summary)?;
    fs::write(&json_path, json).map_err(|source| SvcError::Filesystem {
        identifier: "index".to_string(),
        path: json_path,
        source,
    })?;

    info!("Generated main index: {}", html_path.display());
    Ok(summary)
}

/// Depth-first scan for catalog directories.
///
/// A directory holding `index.json` is a catalog and is not descended into;
/// other directories are searched recursively. Entries are visited in file
/// name order so the result is stable.
pub fn scan_catalogs(catalog_root: &Path) -> Vec<CatalogSummary> {
    let mut catalogs = Vec::new();
    if !catalog_root.is_dir() {
        debug!("No catalog directory at {}", catalog_root.display());
        return catalogs;
    }

    let mut entries = WalkDir::new(catalog_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable catalog entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let data_path = entry.path().join(DATA_ARTIFACT);
        if !data_path.is_file() {
            continue;
        }
        entries.skip_current_dir();

        let relative = entry
            .path()
            .strip_prefix(catalog_root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let fallback_name = entry.file_name().to_string_lossy().into_owned();

        match read_catalog_summary(&data_path, relative, fallback_name) {
            Ok(summary) => catalogs.push(summary),
            Err(e) => warn!("Could not read catalog at {}: {}", data_path.display(), e),
        }
    }

    catalogs
}

/// Count `{slug}/{version}` directories holding an `index.json`
pub fn count_criteria(criteria_root: &Path) -> usize {
    if !criteria_root.is_dir() {
        return 0;
    }

    WalkDir::new(criteria_root)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir() && entry.path().join(DATA_ARTIFACT).is_file())
        .count()
}

fn read_catalog_summary(
    data_path: &Path,
    path: String,
    fallback_name: String,
) -> Result<CatalogSummary> {
    let content = fs::read_to_string(data_path)?;
    let catalog: Value = serde_json::from_str(&content)?;
    let scheme = catalog.get(SCHEME_FIELD);
    let scheme_text = |field: &str| {
        scheme
            .and_then(|s| s.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(CatalogSummary {
        name: scheme_text(NAME_FIELD).unwrap_or(fallback_name),
        description: scheme_text(DESCRIPTION_FIELD).unwrap_or_default(),
        // Numeric versions show with their JSON text, as in the identifier
        version: match scheme.and_then(|s| s.get(VERSION_FIELD)) {
            Some(Value::String(v)) => v.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        },
        path,
        id: catalog
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}
