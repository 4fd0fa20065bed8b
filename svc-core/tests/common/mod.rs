//! Shared fixtures for svc-core integration tests

#![allow(dead_code)]

use anyhow::Result;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use svc_core::config::GeneratorConfig;
use svc_core::generator::{GenerationReport, Generator};

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A catalog with five criteria nodes across three levels
pub fn sample_catalog() -> Value {
    json!({
        "id": "https://catalogs.example.org/rba/vap/8.0.2",
        "type": ["ConformityScheme"],
        "scheme": {
            "name": "RBA Validated Assessment Program",
            "description": "Supplier audit protocol",
            "version": "8.0.2"
        },
        "conformityCriterion": [
            {
                "id": "https://catalogs.example.org/rba/vap/8.0.2#labor",
                "name": "Labor",
                "version": "8.0.2",
                "description": "Labor standards",
                "subCriterion": [
                    {
                        "id": "https://catalogs.example.org/rba/vap/8.0.2#a1",
                        "name": "Freely Chosen Employment",
                        "tags": ["forced-labor"],
                        "subCriterion": [
                            {
                                "id": "https://catalogs.example.org/rba/vap/8.0.2#a1-1",
                                "name": "Forced Labor — Prevention",
                                "version": 2
                            }
                        ]
                    },
                    {
                        "id": "https://catalogs.example.org/rba/vap/8.0.2#a2",
                        "name": "Young Workers"
                    }
                ]
            },
            {
                "id": "https://catalogs.example.org/rba/vap/8.0.2#ethics",
                "name": "Ethics",
                "categories": ["governance"]
            }
        ]
    })
}

pub fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Write `catalog` to `dir/catalog.json` and return its path
pub fn write_catalog(dir: &Path, catalog: &Value) -> Result<PathBuf> {
    let path = dir.join("catalog.json");
    fs::write(&path, serde_json::to_string_pretty(catalog)?)?;
    Ok(path)
}

/// Generate `catalog` into `output_dir` with default settings
pub fn generate_into(output_dir: &Path, catalog: &Value) -> Result<GenerationReport> {
    let generator = Generator::new(GeneratorConfig {
        output_dir: output_dir.to_path_buf(),
        ..GeneratorConfig::default()
    });
    Ok(generator.generate(&as_object(catalog.clone()))?)
}

pub fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}
