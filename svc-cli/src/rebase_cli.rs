//! `svc rebase` - move a catalog document to a new base URL

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use svc_core::rebase::RebaseOptions;

#[derive(Args, Debug)]
pub struct RebaseArgs {
    /// Catalog JSON file to rewrite
    pub input: PathBuf,

    /// Base URL to replace (e.g. "https://example.com")
    #[clap(long, short = 'f')]
    pub from: String,

    /// New base URL (e.g. "https://demo.example.org")
    #[clap(long, short = 't')]
    pub to: String,

    /// Write the result here instead of stdout
    #[clap(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Report what would change without writing anything
    #[clap(long, short = 'd')]
    pub dry_run: bool,

    /// List every rewritten URL
    #[clap(long, short = 'v')]
    pub verbose: bool,
}

pub fn execute(args: RebaseArgs) -> Result<()> {
    info!("Replacing \"{}\" with \"{}\"", args.from, args.to);

    if !args.input.is_file() {
        bail!("Input file does not exist: {}", args.input.display());
    }
    let options = RebaseOptions::new(&args.from, &args.to)?;

    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read input file: {}", args.input.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse input file: {}", args.input.display()))?;
    info!("Loaded catalog: {}", args.input.display());

    let (rebased, stats) = options.rebase(&document);
    info!(
        "Found {} URLs matching \"{}\"",
        stats.urls_found.len(),
        options.from()
    );
    info!("Made {} replacements", stats.total_replacements);

    if args.dry_run {
        warn!("Dry run mode - no files were modified");
        if args.verbose {
            for url in &stats.urls_found {
                let rewritten = options.rewrite(url).unwrap_or_default();
                eprintln!("  {url} -> {rewritten}");
            }
        }
        return Ok(());
    }

    if stats.is_empty() {
        warn!("No URLs found matching \"{}\"", options.from());
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&rebased)?;
    match &args.output {
        Some(output) => {
            if same_file(&args.input, output) {
                create_backup(&args.input)?;
            }
            fs::write(output, json)
                .with_context(|| format!("Failed to write output file: {}", output.display()))?;
            info!("Output written to: {}", output.display());
        }
        None => println!("{json}"),
    }

    info!(
        "Rebased {} URLs from \"{}\" to \"{}\"",
        stats.total_replacements,
        options.from(),
        options.to()
    );
    Ok(())
}

fn same_file(input: &Path, output: &Path) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    }
}

fn create_backup(input: &Path) -> Result<PathBuf> {
    let mut backup = input.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    fs::copy(input, &backup)
        .with_context(|| format!("Failed to create backup: {}", backup.display()))?;
    info!("Backup created: {}", backup.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_backup_appends_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("catalog.json");
        fs::write(&input, "{}").unwrap();

        let backup = create_backup(&input).unwrap();

        assert_eq!(backup, temp_dir.path().join("catalog.json.bak"));
        assert_eq!(fs::read_to_string(backup).unwrap(), "{}");
    }

    #[test]
    fn test_same_file_resolves_relative_forms() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("catalog.json");
        fs::write(&input, "{}").unwrap();
        let dotted = temp_dir.path().join(".").join("catalog.json");

        assert!(same_file(&input, &dotted));
        assert!(!same_file(&input, &temp_dir.path().join("other.json")));
    }
}
