//! Development server with content negotiation
//!
//! Every request goes through a single fallback handler that asks the
//! [`Resolver`] what to serve. The resolver touches the filesystem, so it runs
//! on the blocking pool.

mod negotiate;

pub use negotiate::{accepts, Artifact, Outcome, Preference, Resolver, Served, DEFAULT_ACCEPT};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::layout::HTML_MEDIA_TYPE;
use crate::render::escape_html;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, Accept";
const NO_CACHE: &str = "no-cache";

/// Build the router serving `config.root_dir`
///
/// CORS headers are fixed strings applied to every response, including
/// OPTIONS acknowledgements and error pages.
pub fn router(config: &ServerConfig) -> Router {
    let resolver = Arc::new(Resolver::new(config.root_dir.clone()));
    Router::new()
        .fallback(handle_request)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(resolver)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    let root = std::fs::canonicalize(&config.root_dir).unwrap_or_else(|_| config.root_dir.clone());

    info!("SVC development server running at http://{}/", config.bind_address());
    info!("Serving files from: {}", root.display());
    info!("Content negotiation enabled (HTML/JSON)");
    if config.verbose {
        info!("Verbose logging enabled");
    }
    if !root.is_dir() {
        warn!("Root directory {} does not exist yet; every request will 404", root.display());
    }

    axum::serve(listener, router(&config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

async fn handle_request(
    State(resolver): State<Arc<Resolver>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path().to_string();
    let accept = header_text(&headers, header::ACCEPT);
    let user_agent = header_text(&headers, header::USER_AGENT);
    debug!(
        "{} {} - {}",
        method,
        path,
        user_agent.as_deref().unwrap_or("unknown agent")
    );

    if method == Method::OPTIONS {
        return artifact_response(StatusCode::OK, Vec::new(), None);
    }

    let preference = Preference::from_headers(accept.as_deref(), user_agent.as_deref());
    let lookup = path.clone();
    match tokio::task::spawn_blocking(move || resolver.resolve(&lookup, &preference)).await {
        Ok(resolved) => respond(&path, resolved),
        Err(e) => {
            error!("Resolver task failed for {}: {}", path, e);
            server_error(&e.to_string())
        }
    }
}

/// Turn a resolver outcome into the response sent for `path`
fn respond(path: &str, resolved: Result<Outcome>) -> Response {
    match resolved {
        Ok(Outcome::Data(served) | Outcome::Document(served) | Outcome::Static(served)) => {
            debug!("Served: {} ({})", served.path.display(), served.content_type);
            artifact_response(StatusCode::OK, served.body, Some(served.content_type))
        }
        Ok(Outcome::NotFound) => {
            debug!("404: {}", path);
            artifact_response(
                StatusCode::NOT_FOUND,
                not_found_page(path).into_bytes(),
                Some(HTML_MEDIA_TYPE),
            )
        }
        Err(e) => {
            error!("Error handling request {}: {}", path, error_chain(&e));
            server_error(&error_chain(&e))
        }
    }
}

fn server_error(message: &str) -> Response {
    artifact_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        server_error_page(message).into_bytes(),
        Some(HTML_MEDIA_TYPE),
    )
}

/// Attach cache, type, and length headers to a body
fn artifact_response(
    status: StatusCode,
    body: Vec<u8>,
    content_type: Option<&'static str>,
) -> Response {
    let length = body.len();
    let mut response = (status, body).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    match content_type {
        Some(content_type) => {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            if status == StatusCode::OK {
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
            }
        }
        // Bare acknowledgements carry no body type
        None => {
            headers.remove(header::CONTENT_TYPE);
        }
    }
    response
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

const ERROR_CSS: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Helvetica', 'Arial', sans-serif;
            line-height: 1.6;
            max-width: 600px;
            margin: 0 auto;
            padding: 2rem;
            text-align: center;
        }
        .error-code {
            font-size: 4rem;
            color: #d73a49;
            margin: 0;
        }
        .error-message {
            color: #586069;
        }
        .back-link a {
            color: #0366d6;
            text-decoration: none;
        }"#;

fn error_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{ERROR_CSS}
    </style>
</head>
<body>
{content}
</body>
</html>
"#
    )
}

/// Page for a path that resolved to nothing
pub fn not_found_page(path: &str) -> String {
    error_page(
        "404 - Not Found",
        &format!(
            r#"    <h1 class="error-code">404</h1>
    <p class="error-message">The requested path <code>{}</code> was not found.</p>
    <div class="back-link"><a href="/">&larr; Back to Root</a></div>"#,
            escape_html(path)
        ),
    )
}

/// Page for a request that failed after resolution started
pub fn server_error_page(message: &str) -> String {
    error_page(
        "500 - Internal Server Error",
        &format!(
            r#"    <h1 class="error-code">500</h1>
    <p>Internal Server Error</p>
    <p><code>{}</code></p>"#,
            escape_html(message)
        ),
    )
}
