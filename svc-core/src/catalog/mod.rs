//! SVC Catalog - flattening of monolithic conformity catalogs
//!
//! A catalog is a tree of conformity criteria nested under a scheme. This
//! module turns that tree into independently addressable resources:
//!
//! ```text
//! catalog.json
//!   scheme
//!   conformityCriterion[]
//!     subCriterion[] ...
//!          │
//!          ▼  flatten()
//! RewrittenRoot (criteria replaced by CriterionReference stubs)
//! ResourceMapping { id → independent criterion }
//! ```
//!
//! Payload fields are kept as an open JSON map. Only the fields named by the
//! constants below are interpreted; everything else is copied verbatim.

mod flatten;
mod identity;
mod slug;

pub use flatten::{detect_base_url, flatten, FlattenedCatalog, Flattener};
pub use identity::{
    assign, mint_identifier, validate_version, Assignment, IdentityAssigner, ReferenceStub,
    ResourceMapping,
};
pub use slug::slugify;

use crate::error::{Result, SvcError};
use serde_json::{Map, Value};

/// Field holding a node's identifier
pub const ID_FIELD: &str = "id";
/// Field holding the identifier a node carried in the source document
pub const ORIGINAL_ID_FIELD: &str = "originalId";
pub const NAME_FIELD: &str = "name";
pub const VERSION_FIELD: &str = "version";
pub const SCHEME_FIELD: &str = "scheme";
pub const DESCRIPTION_FIELD: &str = "description";
/// Top-level criteria of a catalog
pub const CRITERIA_FIELD: &str = "conformityCriterion";
/// Nested criteria of a criterion
pub const SUB_CRITERIA_FIELD: &str = "subCriterion";
/// Type tag carried by reference stubs
pub const REFERENCE_KIND: &str = "CriterionReference";

/// Version used when a criterion or scheme declares none
pub const DEFAULT_VERSION: &str = "1";
/// Origin used when none is configured and the catalog id is not a URL
pub const DEFAULT_BASE_URL: &str = "https://responsiblebusiness.org";
/// Default path prefix for criteria identifiers
pub const DEFAULT_CRITERIA_PATH: &str = "criteria";
/// Default path prefix for catalog identifiers
pub const DEFAULT_CATALOG_PATH: &str = "vocabulary";

/// Parse raw catalog text, requiring a JSON object at the top level
pub fn parse_catalog(content: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| SvcError::malformed(format!("catalog is not valid JSON: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SvcError::malformed(format!(
            "catalog must be a JSON object at top level, got {}",
            json_kind(&other)
        ))),
    }
}

/// Resolve the version of a node: the declared version when present and
/// non-empty, otherwise [`DEFAULT_VERSION`].
///
/// Numeric versions are accepted and rendered with their JSON text.
pub fn declared_version(node: &Map<String, Value>) -> String {
    match node.get(VERSION_FIELD) {
        Some(Value::String(v)) if !v.trim().is_empty() => v.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => DEFAULT_VERSION.to_string(),
    }
}

/// The required `name` of a node, or a malformed-input error naming `what`
pub(crate) fn required_name<'a>(node: &'a Map<String, Value>, what: &str) -> Result<&'a str> {
    match node.get(NAME_FIELD) {
        Some(Value::String(name)) => Ok(name),
        Some(other) => Err(SvcError::malformed(format!(
            "{what} name must be a string, got {}",
            json_kind(other)
        ))),
        None => Err(SvcError::malformed(format!("{what} is missing a name"))),
    }
}

/// Short description of a JSON value's type for error messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
