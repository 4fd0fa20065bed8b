//! Runtime configuration for the generator and the server
//!
//! Both structs are plain values with defaults so library callers can build
//! them directly; the CLI fills them from flags.

use std::path::PathBuf;

use crate::catalog::{DEFAULT_CATALOG_PATH, DEFAULT_CRITERIA_PATH};

pub const DEFAULT_OUTPUT_DIR: &str = "dist";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3000;

/// Generator settings
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Root of the generated resource tree
    pub output_dir: PathBuf,
    /// Base URL for minted identifiers; detected from the catalog id when `None`
    pub base_url: Option<String>,
    /// Path prefix for criteria identifiers
    pub criteria_path: String,
    /// Path prefix for catalog identifiers
    pub catalog_path: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            base_url: None,
            criteria_path: DEFAULT_CRITERIA_PATH.to_string(),
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
        }
    }
}

/// Development server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory whose contents are served
    pub root_dir: PathBuf,
    /// Log every request and every served file
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            root_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            verbose: false,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
