use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use genopack::cli;
use genopack::config::{DataLayout, DbsnpImportConfig};
use genopack::dbsnp::import_package;

#[derive(Parser)]
#[command(
    name = "import_dbsnp",
    about = "Normalize a package of dbSNP flat-file dumps into a Genopack dataset"
)]
struct Cli {
    /// Path to the JSON run manifest
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// Output data root directory
    #[arg(short = 'o', long = "out")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli_args = Cli::parse();

    cli::banner("Import dbSNP");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");

    let config = DbsnpImportConfig::from_file(&cli_args.config)?;
    let layout = DataLayout::new(&cli_args.out, &config.species);
    let out_dir = layout.dbsnp_dir(&config.version_name);

    cli::kv("Config", &cli_args.config.display().to_string());
    cli::kv("Species", &config.species);
    cli::kv("Version", &config.version_name);
    cli::kv("Package", &config.package_dir.display().to_string());
    cli::kv("Assembly tag", &config.assembly_tag);
    cli::kv("Output", &out_dir.display().to_string());

    eprintln!();

    // ── Import ───────────────────────────────────────────
    cli::section("Import");

    let import = import_package(&config.package_dir, &out_dir, &config.assembly_tag)
        .context("dbSNP package import failed")?;

    for result in &import.results {
        cli::kv(
            &format!("chr{}", result.chromosome),
            &format!(
                "{} records, {} numeric defaults",
                result.records, result.substitutions
            ),
        );
    }
    for (path, err) in &import.failures {
        cli::warning(&format!("{}: {err}", path.display()));
    }
    if import.results.is_empty() && import.failures.is_empty() {
        cli::warning("no *.flat.gz files found in the package directory");
    } else {
        let records: usize = import.results.iter().map(|r| r.records).sum();
        let substitutions: usize = import.results.iter().map(|r| r.substitutions).sum();
        cli::success(&format!(
            "{} files imported, {} records, {} numeric defaults",
            import.results.len(),
            records,
            substitutions
        ));
    }

    cli::print_summary(start);
    Ok(())
}
