//! SVC - independent criteria for sustainability conformity catalogs
//!
//! Entry point for the `generate`, `serve`, and `rebase` commands

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use svc_core::catalog::{DEFAULT_CATALOG_PATH, DEFAULT_CRITERIA_PATH};
use svc_core::config::{
    GeneratorConfig, ServerConfig, DEFAULT_HOST, DEFAULT_OUTPUT_DIR, DEFAULT_PORT,
};
use svc_core::generator::Generator;
use svc_core::{server, SvcError};

mod rebase_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "svc",
    about = "Flatten conformity catalogs into independently addressable criteria",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,
}

#[derive(Parser, Debug)]
enum Command {
    /// Generate independent criteria and catalog pages from a catalog file
    Generate {
        /// Catalog JSON file to flatten
        catalog: PathBuf,

        /// Directory to write the resource tree into
        #[clap(long, short = 'o', default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Base URL for minted identifiers (detected from the catalog id when omitted)
        #[clap(long)]
        base_url: Option<String>,

        /// Path prefix for criteria identifiers
        #[clap(long, default_value = DEFAULT_CRITERIA_PATH)]
        criteria_path: String,

        /// Path prefix for catalog identifiers
        #[clap(long, default_value = DEFAULT_CATALOG_PATH)]
        catalog_path: String,

        /// Log every generated resource
        #[clap(long, short = 'v')]
        verbose: bool,
    },

    /// Serve a generated tree with JSON/HTML content negotiation
    Serve {
        #[clap(long, default_value = DEFAULT_HOST)]
        host: String,

        #[clap(long, short = 'p', default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Directory to serve
        #[clap(long, short = 'r', default_value = DEFAULT_OUTPUT_DIR)]
        root_dir: PathBuf,

        /// Log every request and served file
        #[clap(long, short = 'v')]
        verbose: bool,
    },

    /// Replace the base URL of every matching string in a catalog file
    Rebase(rebase_cli::RebaseArgs),
}

impl Command {
    fn verbose(&self) -> bool {
        match self {
            Command::Generate { verbose, .. } | Command::Serve { verbose, .. } => *verbose,
            Command::Rebase(args) => args.verbose,
        }
    }
}

fn initialize_tracing(log_level: &LogLevel, verbose: bool) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    if verbose {
        for directive in ["svc_core=debug", "svc=debug", "tower_http=debug"] {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout is reserved for rebase output
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.command.verbose());

    let result = match cli.command {
        Command::Generate {
            catalog,
            output_dir,
            base_url,
            criteria_path,
            catalog_path,
            verbose: _,
        } => {
            let config = GeneratorConfig {
                output_dir,
                base_url,
                criteria_path,
                catalog_path,
            };
            generate_command(catalog, config)
        }
        Command::Serve {
            host,
            port,
            root_dir,
            verbose,
        } => {
            serve_command(ServerConfig {
                host,
                port,
                root_dir,
                verbose,
            })
            .await
        }
        Command::Rebase(args) => rebase_cli::execute(args),
    };

    if let Err(e) = &result {
        if let Some(svc_error) = e.downcast_ref::<SvcError>() {
            if svc_error.is_input_error() {
                error!("The catalog input was rejected; fix the document and run again");
            }
        }
    }
    result
}

fn generate_command(catalog: PathBuf, config: GeneratorConfig) -> Result<()> {
    if let Some(base_url) = &config.base_url {
        url::Url::parse(base_url).with_context(|| format!("Invalid --base-url: {base_url}"))?;
    }

    info!("Generating from {}", catalog.display());
    let output_dir = config.output_dir.clone();
    let generator = Generator::new(config);
    let report = generator
        .generate_from_catalog(&catalog)
        .with_context(|| format!("Failed to generate from {}", catalog.display()))?;

    println!("Generated {} criteria", report.criteria.len());
    println!("Catalog: {}", report.catalog);
    println!("Base URL: {}", report.base_url);
    println!("Output: {}", output_dir.display());
    Ok(())
}

async fn serve_command(config: ServerConfig) -> Result<()> {
    let address = config.bind_address();
    server::serve(config)
        .await
        .with_context(|| format!("Failed to serve on {address}"))
}
