//! Whole-catalog flattening
//!
//! Drives the [`IdentityAssigner`] over every top-level criterion and rewrites
//! the catalog root so it references criteria by identifier. The root itself
//! gets an identifier under the catalog path prefix so it can be materialized
//! like any other resource.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::identity::{IdentityAssigner, ReferenceStub, ResourceMapping};
use super::{
    declared_version, json_kind, required_name, CRITERIA_FIELD, DEFAULT_BASE_URL,
    DEFAULT_CATALOG_PATH, DEFAULT_CRITERIA_PATH, ID_FIELD, ORIGINAL_ID_FIELD, SCHEME_FIELD,
};
use crate::error::{Result, SvcError};

/// Output of [`flatten`]: the rewritten root plus every independent criterion
#[derive(Debug, Clone)]
pub struct FlattenedCatalog {
    /// Base URL every identifier was minted under
    pub base_url: String,
    /// Rewritten catalog root, its criteria replaced by reference stubs
    pub root: Map<String, Value>,
    /// Identifier → independent criterion
    pub resources: ResourceMapping,
}

impl FlattenedCatalog {
    /// Identifier minted for the catalog root
    pub fn root_id(&self) -> &str {
        self.root
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Flattening parameters
#[derive(Debug, Clone)]
pub struct Flattener {
    /// Explicit base URL; detected from the catalog id when `None`
    pub base_url: Option<String>,
    pub criteria_path: String,
    pub catalog_path: String,
}

impl Default for Flattener {
    fn default() -> Self {
        Self {
            base_url: None,
            criteria_path: DEFAULT_CRITERIA_PATH.to_string(),
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
        }
    }
}

impl Flattener {
    /// Flatten `catalog` into a rewritten root and a resource mapping.
    ///
    /// `catalog` is never modified; the rewritten root and every resource are
    /// independent copies.
    pub fn flatten(&self, catalog: &Map<String, Value>) -> Result<FlattenedCatalog> {
        let scheme = match catalog.get(SCHEME_FIELD) {
            Some(Value::Object(scheme)) => scheme,
            Some(other) => {
                return Err(SvcError::malformed(format!(
                    "catalog scheme must be an object, got {}",
                    json_kind(other)
                )))
            }
            None => return Err(SvcError::malformed("catalog is missing a scheme")),
        };
        let scheme_name = required_name(scheme, "catalog scheme")?;
        info!("Processing catalog: {}", scheme_name);

        let base_url = match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let detected = detect_base_url(catalog);
                info!("Detected base URL: {}", detected);
                detected
            }
        };

        let criteria = IdentityAssigner::new(&base_url, &self.criteria_path);
        let mut resources = ResourceMapping::new();
        let mut root = catalog.clone();

        match catalog.get(CRITERIA_FIELD) {
            None => debug!("catalog declares no criteria"),
            Some(Value::Array(items)) => {
                let mut stubs: Vec<ReferenceStub> = Vec::with_capacity(items.len());
                for item in items {
                    let criterion = item.as_object().ok_or_else(|| {
                        SvcError::malformed(format!(
                            "{CRITERIA_FIELD} entries must be objects, got {}",
                            json_kind(item)
                        ))
                    })?;
                    stubs.push(criteria.assign(criterion, &mut resources)?.stub());
                }
                root.insert(
                    CRITERIA_FIELD.to_string(),
                    Value::Array(
                        stubs
                            .iter()
                            .map(ReferenceStub::to_value)
                            .collect::<Result<_>>()?,
                    ),
                );
            }
            Some(other) => {
                return Err(SvcError::malformed(format!(
                    "{CRITERIA_FIELD} must be an array, got {}",
                    json_kind(other)
                )))
            }
        }

        let catalogs = IdentityAssigner::new(&base_url, &self.catalog_path);
        let root_id = catalogs.mint(scheme_name, &declared_version(scheme))?;
        root.insert(ID_FIELD.to_string(), Value::String(root_id.clone()));
        if let Some(original) = catalog.get(ID_FIELD) {
            root.insert(ORIGINAL_ID_FIELD.to_string(), original.clone());
        }
        debug!(%root_id, criteria = resources.len(), "flattened catalog");

        Ok(FlattenedCatalog {
            base_url,
            root,
            resources,
        })
    }
}

/// Flatten `catalog` with default path prefixes and a detected base URL
pub fn flatten(catalog: &Map<String, Value>) -> Result<FlattenedCatalog> {
    Flattener::default().flatten(catalog)
}

/// Derive `scheme://host[:port]` from the catalog id, falling back to
/// [`DEFAULT_BASE_URL`] when the id is missing or not a hierarchical URL.
pub fn detect_base_url(catalog: &Map<String, Value>) -> String {
    if let Some(id) = catalog.get(ID_FIELD).and_then(Value::as_str) {
        match Url::parse(id) {
            Ok(url) => {
                if let Some(host) = url.host_str() {
                    return match url.port() {
                        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                        None => format!("{}://{}", url.scheme(), host),
                    };
                }
                warn!("Catalog id has no host: {}", id);
            }
            Err(e) => warn!("Could not parse catalog id as URL: {} ({})", id, e),
        }
    }

    warn!("Could not detect base URL from catalog, using default");
    DEFAULT_BASE_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn sample_catalog() -> Map<String, Value> {
        object(json!({
            "id": "https://svc.example.org:8443/catalogs/rba/8.0.2",
            "type": ["Catalog"],
            "scheme": {
                "name": "Validated Assessment Program",
                "description": "RBA audit protocol",
                "version": "8.0.2"
            },
            "conformityCriterion": [
                {
                    "id": "https://svc.example.org/catalogs/rba/8.0.2#labor",
                    "name": "Labor",
                    "subCriterion": [
                        {"id": "https://svc.example.org/catalogs/rba/8.0.2#labor-1", "name": "Freely Chosen Employment"}
                    ]
                },
                {"id": "https://svc.example.org/catalogs/rba/8.0.2#ethics", "name": "Ethics", "version": "2"}
            ]
        }))
    }

    #[test]
    fn test_detect_base_url_keeps_port() {
        assert_eq!(
            detect_base_url(&sample_catalog()),
            "https://svc.example.org:8443"
        );
    }

    #[test]
    fn test_detect_base_url_fallbacks() {
        assert_eq!(
            detect_base_url(&object(json!({"id": "not a url"}))),
            DEFAULT_BASE_URL
        );
        assert_eq!(
            detect_base_url(&object(json!({"id": "urn:svc:catalog"}))),
            DEFAULT_BASE_URL
        );
        assert_eq!(detect_base_url(&object(json!({}))), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_flatten_rewrites_root() {
        let catalog = sample_catalog();
        let flattened = flatten(&catalog).unwrap();

        assert_eq!(flattened.base_url, "https://svc.example.org:8443");
        assert_eq!(
            flattened.root_id(),
            "https://svc.example.org:8443/vocabulary/validated-assessment-program/8.0.2/"
        );
        assert_eq!(
            flattened.root["originalId"],
            json!("https://svc.example.org/catalogs/rba/8.0.2")
        );
        assert_eq!(flattened.resources.len(), 3);
        assert_eq!(
            flattened.root["conformityCriterion"],
            json!([
                {
                    "type": ["CriterionReference"],
                    "id": "https://svc.example.org:8443/criteria/labor/1/",
                    "name": "Labor",
                    "version": "1"
                },
                {
                    "type": ["CriterionReference"],
                    "id": "https://svc.example.org:8443/criteria/ethics/2/",
                    "name": "Ethics",
                    "version": "2"
                }
            ])
        );
        assert_eq!(flattened.root["scheme"], catalog["scheme"]);
    }

    #[test]
    fn test_flatten_leaves_input_untouched() {
        let catalog = sample_catalog();
        let before = catalog.clone();
        flatten(&catalog).unwrap();
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_flatten_with_explicit_base_url_and_paths() {
        let flattener = Flattener {
            base_url: Some("https://demo.example.com/".to_string()),
            criteria_path: "c".to_string(),
            catalog_path: "v".to_string(),
        };
        let flattened = flattener.flatten(&sample_catalog()).unwrap();

        assert_eq!(
            flattened.root_id(),
            "https://demo.example.com/v/validated-assessment-program/8.0.2/"
        );
        assert!(flattened
            .resources
            .contains_key("https://demo.example.com/c/freely-chosen-employment/1/"));
    }

    #[test]
    fn test_flatten_without_criteria() {
        let catalog = object(json!({
            "id": "https://example.org/x",
            "scheme": {"name": "Empty Scheme"}
        }));
        let flattened = flatten(&catalog).unwrap();

        assert!(flattened.resources.is_empty());
        assert!(flattened.root.get("conformityCriterion").is_none());
        assert_eq!(
            flattened.root_id(),
            "https://example.org/vocabulary/empty-scheme/1/"
        );
    }

    #[test]
    fn test_flatten_requires_scheme() {
        let err = flatten(&object(json!({"id": "https://example.org/x"}))).unwrap_err();
        assert!(err.to_string().contains("missing a scheme"));

        let err = flatten(&object(json!({"scheme": "RBA"}))).unwrap_err();
        assert!(err.is_input_error());

        let err = flatten(&object(json!({"scheme": {"description": "no name"}}))).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_flatten_rejects_non_array_criteria() {
        let err = flatten(&object(json!({
            "scheme": {"name": "S"},
            "conformityCriterion": {"name": "oops"}
        })))
        .unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn test_flatten_rejects_unsafe_scheme_version() {
        let err = flatten(&object(json!({
            "id": "https://example.org/x",
            "scheme": {"name": "S", "version": "1/../../criteria/a"}
        })))
        .unwrap_err();
        assert!(matches!(err, SvcError::MalformedInput(_)));
    }
}
