//! HTML rendering of criteria, catalogs, and the discovery index
//!
//! Rendering sits behind the [`Renderer`] trait so the materializer only sees
//! "resource in, document out". [`HtmlRenderer`] produces standalone pages with
//! inline styles; every interpolated value is escaped.

use serde_json::{Map, Value};

use crate::catalog::{
    declared_version, CRITERIA_FIELD, DESCRIPTION_FIELD, NAME_FIELD, SCHEME_FIELD,
    SUB_CRITERIA_FIELD, VERSION_FIELD,
};
use crate::generator::IndexSummary;
use crate::layout::DATA_ARTIFACT;

/// Produces the rendered-document artifact for a resource
pub trait Renderer {
    /// Page for one independent criterion
    fn render_criterion(&self, criterion: &Map<String, Value>) -> String;

    /// Page for a rewritten catalog root
    fn render_catalog(&self, catalog: &Map<String, Value>) -> String;

    /// Top-level discovery page
    fn render_index(&self, index: &IndexSummary) -> String;
}

/// Default renderer producing standalone HTML pages
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

const BASE_CSS: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Helvetica', 'Arial', sans-serif;
            line-height: 1.6;
            max-width: 800px;
            margin: 0 auto;
            padding: 2rem;
            color: #24292f;
        }
        .page-header {
            border-bottom: 2px solid #d0d7de;
            padding-bottom: 1rem;
            margin-bottom: 2rem;
        }
        .meta {
            display: flex;
            gap: 1rem;
            margin-top: 1rem;
            flex-wrap: wrap;
        }
        .meta-item {
            background: #f6f8fa;
            padding: 0.25rem 0.75rem;
            border-radius: 1rem;
            font-size: 0.875rem;
        }
        .criterion-link { color: #0969da; text-decoration: none; }
        .criterion-link:hover { text-decoration: underline; }
        .tag {
            background: #ddf4ff;
            color: #0969da;
            padding: 0.25rem 0.5rem;
            border-radius: 0.5rem;
            font-size: 0.75rem;
        }
        .tag-list { display: flex; flex-wrap: wrap; gap: 0.5rem; }
        section { margin: 2rem 0; }
        .json-link {
            float: right;
            background: #f6f8fa;
            border: 1px solid #d0d7de;
            padding: 0.5rem 1rem;
            border-radius: 0.375rem;
            text-decoration: none;
            color: #24292f;
            font-size: 0.875rem;
        }
        .version { color: #656d76; font-size: 0.875rem; }"#;

const INDEX_CSS: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            max-width: 1200px;
            margin: 0 auto;
            padding: 2rem;
            color: #333;
            background: #f8f9fa;
        }
        h1 { color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 0.5rem; }
        .panel {
            background: white;
            padding: 1.5rem;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
            margin-bottom: 2rem;
        }
        .stats {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 1rem;
        }
        .stat-card {
            background: #f8f9fa;
            padding: 1rem;
            border-radius: 6px;
            text-align: center;
            border-left: 4px solid #3498db;
        }
        .stat-number { font-size: 2rem; font-weight: bold; color: #2c3e50; }
        .stat-label { color: #7f8c8d; font-size: 0.875rem; text-transform: uppercase; }
        .catalog-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(400px, 1fr));
            gap: 1.5rem;
        }
        .catalog-card {
            background: white;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
            padding: 1.5rem;
        }
        .catalog-title { color: #2c3e50; margin: 0 0 0.5rem 0; font-size: 1.25rem; }
        .catalog-version { color: #7f8c8d; font-size: 0.875rem; margin-bottom: 1rem; }
        .catalog-links { display: flex; gap: 1rem; }
        .catalog-link {
            padding: 0.5rem 1rem;
            text-decoration: none;
            border-radius: 4px;
            font-size: 0.875rem;
            color: white;
        }
        .catalog-link.html { background: #3498db; }
        .catalog-link.json { background: #95a5a6; }
        .empty-state { text-align: center; padding: 3rem; color: #7f8c8d; }"#;

impl Renderer for HtmlRenderer {
    fn render_criterion(&self, criterion: &Map<String, Value>) -> String {
        let title = text_field(criterion, NAME_FIELD).unwrap_or("Criterion");

        let mut meta = String::new();
        if let Some(status) = text_field(criterion, "status") {
            meta.push_str(&format!(
                r#"<span class="meta-item">Status: {}</span>"#,
                escape_html(status)
            ));
        }
        if let Some(topic) = text_field(criterion, "conformityTopic") {
            meta.push_str(&format!(
                r#"<span class="meta-item">Topic: {}</span>"#,
                escape_html(topic)
            ));
        }
        meta.push_str(&format!(
            r#"<span class="meta-item">Version: {}</span>"#,
            escape_html(&declared_version(criterion))
        ));

        let mut body = description_section(criterion);
        body.push_str(&reference_list(criterion, SUB_CRITERIA_FIELD, "Sub-criteria"));
        body.push_str(&categories_section(criterion));
        body.push_str(&tags_section(criterion));

        page(
            title,
            BASE_CSS,
            &format!(
                r#"    <div class="page-header">
        <h1>{title}</h1>
        <div class="meta">{meta}</div>
    </div>
{body}"#,
                title = escape_html(title),
            ),
        )
    }

    fn render_catalog(&self, catalog: &Map<String, Value>) -> String {
        let scheme = catalog.get(SCHEME_FIELD).and_then(Value::as_object);
        let title = scheme
            .and_then(|s| text_field(s, NAME_FIELD))
            .unwrap_or("SVC Catalog");

        let version = scheme
            .and_then(|s| text_field(s, VERSION_FIELD))
            .map(|v| format!(r#"<div class="version">Version: {}</div>"#, escape_html(v)))
            .unwrap_or_default();

        let mut body = scheme.map(description_section).unwrap_or_default();
        body.push_str(&reference_list(catalog, CRITERIA_FIELD, "Conformity Criteria"));

        page(
            title,
            BASE_CSS,
            &format!(
                r#"    <div class="page-header">
        <h1>{title}</h1>
        {version}
    </div>
{body}"#,
                title = escape_html(title),
            ),
        )
    }

    fn render_index(&self, index: &IndexSummary) -> String {
        let catalog_count = index.catalogs.len();
        let plural = if catalog_count == 1 { "" } else { "s" };

        let catalogs = if index.catalogs.is_empty() {
            r#"    <div class="empty-state">
        <h2>No catalogs found</h2>
        <p>Run the SVC generator to create catalogs with independent criteria.</p>
    </div>"#
                .to_string()
        } else {
            let cards: String = index
                .catalogs
                .iter()
                .map(|catalog| {
                    let href = format!(
                        "{}/{}/",
                        index.catalog_path.trim_matches('/'),
                        catalog.path
                    );
                    let version = if catalog.version.is_empty() {
                        String::new()
                    } else {
                        format!(
                            r#"<div class="catalog-version">Version: {}</div>"#,
                            escape_html(&catalog.version)
                        )
                    };
                    let description = if catalog.description.is_empty() {
                        String::new()
                    } else {
                        format!("<p>{}</p>", escape_html(&catalog.description))
                    };
                    format!(
                        r#"
        <div class="catalog-card">
            <h2 class="catalog-title">{name}</h2>
            {version}
            {description}
            <div class="catalog-links">
                <a href="{href}" class="catalog-link html">View HTML</a>
                <a href="{href}{data}" class="catalog-link json">View JSON</a>
            </div>
        </div>"#,
                        name = escape_html(&catalog.name),
                        href = escape_html(&href),
                        data = DATA_ARTIFACT,
                    )
                })
                .collect();
            format!("    <div class=\"catalog-grid\">{cards}\n    </div>")
        };

        let criteria_path = escape_html(index.criteria_path.trim_matches('/'));
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SVC Independent Criteria - Generated Catalogs</title>
    <style>{css}
    </style>
    <link rel="alternate" type="application/json" href="./{data}" title="JSON representation">
</head>
<body>
    <h1>SVC Independent Criteria</h1>

    <div class="panel">
        <p>Independently versioned criteria generated from SVC catalogs. Each criterion has its own URL and can be versioned separately from the catalog.</p>
        <div class="stats">
            <div class="stat-card">
                <div class="stat-number">{catalog_count}</div>
                <div class="stat-label">Catalog{plural}</div>
            </div>
            <div class="stat-card">
                <div class="stat-number">{criteria_count}</div>
                <div class="stat-label">Independent Criteria</div>
            </div>
        </div>
    </div>

{catalogs}

    <div class="panel">
        <p>URLs serve HTML for browsers and JSON for API clients.</p>
        <p>Each criterion URL pattern: <code>{criteria_path}/{{criterion-name}}/{{version}}/</code></p>
    </div>
</body>
</html>
"#,
            css = INDEX_CSS,
            data = DATA_ARTIFACT,
            criteria_count = index.criteria_count,
        )
    }
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, css: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}
    </style>
    <link rel="alternate" type="application/json" href="./{data}" title="JSON representation">
</head>
<body>
    <a href="./{data}" class="json-link">View JSON</a>

{content}
    <section class="json-data">
        <h2>JSON Data</h2>
        <p><a href="./{data}" class="criterion-link">Download as JSON</a></p>
    </section>
</body>
</html>
"#,
        title = escape_html(title),
        data = DATA_ARTIFACT,
    )
}

fn text_field<'a>(node: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    node.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn description_section(node: &Map<String, Value>) -> String {
    match text_field(node, DESCRIPTION_FIELD) {
        Some(description) => format!(
            r#"    <section class="description">
        <h2>Description</h2>
        <p>{}</p>
    </section>
"#,
            escape_html(description)
        ),
        None => String::new(),
    }
}

/// List of links built from reference stubs under `field`
fn reference_list(node: &Map<String, Value>, field: &str, heading: &str) -> String {
    let stubs = match node.get(field).and_then(Value::as_array) {
        Some(stubs) if !stubs.is_empty() => stubs,
        _ => return String::new(),
    };

    let items: String = stubs
        .iter()
        .filter_map(Value::as_object)
        .map(|stub| {
            let id = text_field(stub, "id").unwrap_or("#");
            let name = text_field(stub, NAME_FIELD).unwrap_or(id);
            format!(
                r#"
            <li><a href="{}" class="criterion-link">{} (v{})</a></li>"#,
                escape_html(id),
                escape_html(name),
                escape_html(&declared_version(stub))
            )
        })
        .collect();

    format!(
        r#"    <section class="references">
        <h2>{heading}</h2>
        <ul>{items}
        </ul>
    </section>
"#
    )
}

fn categories_section(criterion: &Map<String, Value>) -> String {
    let categories = match criterion.get("category").and_then(Value::as_array) {
        Some(categories) if !categories.is_empty() => categories,
        _ => return String::new(),
    };

    let items: String = categories
        .iter()
        .filter_map(Value::as_object)
        .map(|category| {
            format!(
                r#"
            <li><strong>{}:</strong> {}<br><em>{}</em></li>"#,
                escape_html(text_field(category, "code").unwrap_or_default()),
                escape_html(text_field(category, NAME_FIELD).unwrap_or_default()),
                escape_html(text_field(category, "schemeName").unwrap_or_default())
            )
        })
        .collect();

    format!(
        r#"    <section class="categories">
        <h2>Categories</h2>
        <ul>{items}
        </ul>
    </section>
"#
    )
}

fn tags_section(criterion: &Map<String, Value>) -> String {
    let tags: Vec<&str> = criterion
        .get("tag")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if tags.is_empty() {
        return String::new();
    }

    let spans: String = tags
        .iter()
        .map(|tag| format!(r#"<span class="tag">{}</span>"#, escape_html(tag)))
        .collect();

    format!(
        r#"    <section class="tags">
        <h2>Tags</h2>
        <div class="tag-list">{spans}</div>
    </section>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::CatalogSummary;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_criterion_page_lists_everything() {
        let criterion = object(json!({
            "id": "https://example.org/criteria/labor/2/",
            "name": "Labor <Rights>",
            "version": "2",
            "status": "active",
            "conformityTopic": "Social",
            "description": "Workers are free",
            "subCriterion": [
                {"type": ["CriterionReference"], "id": "https://example.org/criteria/wages/1/", "name": "Wages", "version": "1"}
            ],
            "category": [{"code": "L1", "name": "Labor", "schemeName": "RBA"}],
            "tag": ["social", "labor"]
        }));

        let html = HtmlRenderer.render_criterion(&criterion);

        assert!(html.contains("<title>Labor &lt;Rights&gt;</title>"));
        assert!(html.contains("Status: active"));
        assert!(html.contains("Topic: Social"));
        assert!(html.contains("Version: 2"));
        assert!(html.contains("Workers are free"));
        assert!(html.contains(r#"href="https://example.org/criteria/wages/1/""#));
        assert!(html.contains("Wages (v1)"));
        assert!(html.contains("<strong>L1:</strong> Labor"));
        assert!(html.contains(r#"<span class="tag">social</span>"#));
    }

    #[test]
    fn test_criterion_page_defaults() {
        let html = HtmlRenderer.render_criterion(&Map::new());
        assert!(html.contains("<title>Criterion</title>"));
        assert!(html.contains("Version: 1"));
        assert!(!html.contains("Sub-criteria"));
        assert!(!html.contains("Tags"));
    }

    #[test]
    fn test_catalog_page() {
        let catalog = object(json!({
            "scheme": {"name": "RBA VAP", "description": "Audit protocol", "version": "8.0.2"},
            "conformityCriterion": [
                {"type": ["CriterionReference"], "id": "https://example.org/criteria/labor/1/", "name": "Labor", "version": "1"}
            ]
        }));

        let html = HtmlRenderer.render_catalog(&catalog);

        assert!(html.contains("<h1>RBA VAP</h1>"));
        assert!(html.contains("Version: 8.0.2"));
        assert!(html.contains("Audit protocol"));
        assert!(html.contains("Conformity Criteria"));
        assert!(html.contains("Labor (v1)"));
    }

    #[test]
    fn test_index_page() {
        let index = IndexSummary {
            catalogs: vec![CatalogSummary {
                name: "RBA VAP".to_string(),
                description: String::new(),
                version: "8.0.2".to_string(),
                path: "rba-vap/8.0.2".to_string(),
                id: "https://example.org/vocabulary/rba-vap/8.0.2/".to_string(),
            }],
            criteria_count: 12,
            catalog_path: "vocabulary".to_string(),
            criteria_path: "criteria".to_string(),
        };

        let html = HtmlRenderer.render_index(&index);

        assert!(html.contains(r#"<div class="stat-number">1</div>"#));
        assert!(html.contains(">Catalog<"));
        assert!(html.contains(r#"<div class="stat-number">12</div>"#));
        assert!(html.contains(r#"href="vocabulary/rba-vap/8.0.2/""#));
        assert!(html.contains(r#"href="vocabulary/rba-vap/8.0.2/index.json""#));
        assert!(html.contains("criteria/{criterion-name}/{version}/"));
    }

    #[test]
    fn test_index_page_empty() {
        let index = IndexSummary {
            catalogs: vec![],
            criteria_count: 0,
            catalog_path: "vocabulary".to_string(),
            criteria_path: "criteria".to_string(),
        };
        let html = HtmlRenderer.render_index(&index);
        assert!(html.contains("No catalogs found"));
        assert!(html.contains(">Catalogs<"));
    }
}
