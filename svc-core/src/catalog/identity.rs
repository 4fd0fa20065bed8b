//! Identifier minting and criterion flattening
//!
//! Every criterion gets an absolute identifier of the form
//! `{base_url}/{path_prefix}/{slug}/{version}/`. Children are assigned first;
//! the parent then embeds [`ReferenceStub`]s in place of the nested nodes, and
//! every assigned resource lands in the shared [`ResourceMapping`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::{
    declared_version, json_kind, required_name, slugify, ID_FIELD, NAME_FIELD, ORIGINAL_ID_FIELD,
    REFERENCE_KIND, SUB_CRITERIA_FIELD,
};
use crate::error::{Result, SvcError};

/// Identifier → independent resource, iterated in identifier order
pub type ResourceMapping = BTreeMap<String, Map<String, Value>>;

/// Lightweight pointer left in place of a nested criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceStub {
    /// Always `["CriterionReference"]`
    #[serde(rename = "type")]
    pub kind: Vec<String>,
    pub id: String,
    pub name: String,
    pub version: String,
}

impl ReferenceStub {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: vec![REFERENCE_KIND.to_string()],
            id: id.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Result of assigning an identity to one criterion
#[derive(Debug, Clone)]
pub struct Assignment {
    pub identifier: String,
    /// The independent resource, identical to the copy stored in the mapping
    pub resource: Map<String, Value>,
    /// Stubs for the criterion's direct children, in source order
    pub children: Vec<ReferenceStub>,
    name: String,
    version: String,
}

impl Assignment {
    /// Stub the parent embeds for this criterion
    pub fn stub(&self) -> ReferenceStub {
        ReferenceStub::new(&self.identifier, &self.name, &self.version)
    }
}

/// Build `{base_url}/{path_prefix}/{slug}/{version}/`
pub fn mint_identifier(base_url: &str, path_prefix: &str, slug: &str, version: &str) -> String {
    format!(
        "{}/{}/{}/{}/",
        base_url.trim_end_matches('/'),
        path_prefix.trim_matches('/'),
        slug,
        version
    )
}

/// Check that `version` maps onto exactly one URL path segment and one
/// directory: no separators, no query or fragment delimiters, no escapes, no
/// whitespace, and not a relative segment.
pub fn validate_version(name: &str, version: &str) -> Result<()> {
    let unsafe_char = version.chars().find(|c| {
        matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control()
    });
    if let Some(c) = unsafe_char {
        return Err(SvcError::malformed(format!(
            "version '{version}' of '{name}' contains {c:?}, which cannot appear in an identifier path segment"
        )));
    }
    if version.is_empty() || version == "." || version == ".." {
        return Err(SvcError::malformed(format!(
            "version '{version}' of '{name}' is not a usable identifier path segment"
        )));
    }
    Ok(())
}

/// Mints identifiers under one base URL and path prefix
#[derive(Debug, Clone)]
pub struct IdentityAssigner {
    base_url: String,
    path_prefix: String,
}

impl IdentityAssigner {
    pub fn new(base_url: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path_prefix: path_prefix.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Mint the identifier for a node with the given name and version.
    ///
    /// Fails when the name produces an empty slug or the version cannot be a
    /// single path segment.
    pub fn mint(&self, name: &str, version: &str) -> Result<String> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(SvcError::malformed(format!(
                "name '{name}' does not contain any letters or digits to build an identifier from"
            )));
        }
        validate_version(name, version)?;
        Ok(mint_identifier(
            &self.base_url,
            &self.path_prefix,
            &slug,
            version,
        ))
    }

    /// Assign identities to `criterion` and all of its descendants.
    ///
    /// Every produced resource is inserted into `mapping`. Re-inserting an
    /// identical resource under the same identifier is accepted; a different
    /// resource under an existing identifier is an
    /// [`SvcError::IdentifierCollision`].
    pub fn assign(
        &self,
        criterion: &Map<String, Value>,
        mapping: &mut ResourceMapping,
    ) -> Result<Assignment> {
        let name = required_name(criterion, "criterion")?.to_string();
        let version = declared_version(criterion);
        let identifier = self.mint(&name, &version)?;
        trace!(%identifier, "minted criterion identifier");

        let children = match criterion.get(SUB_CRITERIA_FIELD) {
            None => Vec::new(),
            Some(Value::Array(items)) => {
                let mut stubs = Vec::with_capacity(items.len());
                for item in items {
                    let child = item.as_object().ok_or_else(|| {
                        SvcError::malformed(format!(
                            "sub-criterion of '{name}' must be an object, got {}",
                            json_kind(item)
                        ))
                    })?;
                    stubs.push(self.assign(child, mapping)?.stub());
                }
                stubs
            }
            Some(other) => {
                return Err(SvcError::malformed(format!(
                    "{SUB_CRITERIA_FIELD} of '{name}' must be an array, got {}",
                    json_kind(other)
                )))
            }
        };

        let mut resource = criterion.clone();
        resource.insert(ID_FIELD.to_string(), Value::String(identifier.clone()));
        if let Some(original) = criterion.get(ID_FIELD) {
            resource.insert(ORIGINAL_ID_FIELD.to_string(), original.clone());
        }
        if resource.contains_key(SUB_CRITERIA_FIELD) {
            resource.insert(
                SUB_CRITERIA_FIELD.to_string(),
                Value::Array(
                    children
                        .iter()
                        .map(ReferenceStub::to_value)
                        .collect::<Result<_>>()?,
                ),
            );
        }

        insert_resource(mapping, &identifier, &resource)?;

        Ok(Assignment {
            identifier,
            resource,
            children,
            name,
            version,
        })
    }
}

/// Assign identities to `criterion` under `base_url`/`path_prefix`, recording
/// every resource in `mapping`.
pub fn assign(
    criterion: &Map<String, Value>,
    base_url: &str,
    path_prefix: &str,
    mapping: &mut ResourceMapping,
) -> Result<Assignment> {
    IdentityAssigner::new(base_url, path_prefix).assign(criterion, mapping)
}

fn insert_resource(
    mapping: &mut ResourceMapping,
    identifier: &str,
    resource: &Map<String, Value>,
) -> Result<()> {
    match mapping.get(identifier) {
        Some(existing) if existing == resource => {
            debug!(%identifier, "criterion repeated with identical content");
            Ok(())
        }
        Some(existing) => Err(SvcError::IdentifierCollision {
            identifier: identifier.to_string(),
            first: describe(existing),
            second: describe(resource),
        }),
        None => {
            mapping.insert(identifier.to_string(), resource.clone());
            Ok(())
        }
    }
}

fn describe(resource: &Map<String, Value>) -> String {
    let origin = resource
        .get(ORIGINAL_ID_FIELD)
        .and_then(Value::as_str)
        .or_else(|| resource.get(NAME_FIELD).and_then(Value::as_str));
    origin.unwrap_or("<unnamed>").to_string()
}
