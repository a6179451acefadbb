use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;

use genopack::annotation::{self, ImportStats, Registry};
use genopack::cli;
use genopack::config::{DataLayout, GenomeImportConfig};
use genopack::genome::Genome;
use genopack::sequence::{SequenceSet, import_sequences};
use genopack::symbol_index::build_symbol_index;

#[derive(Parser)]
#[command(
    name = "import_genome",
    about = "Import a genome package (sequences + GTF annotation) into a Genopack dataset"
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

    cli::banner("Import Genome");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");

    let config = GenomeImportConfig::from_file(&cli_args.config)?;
    let layout = DataLayout::new(&cli_args.out, &config.species);
    let genome_dir = layout.genome_dir(&config.genome_name);
    let gene_sets_dir = layout.gene_sets_dir(&config.genome_name);

    cli::kv("Config", &cli_args.config.display().to_string());
    cli::kv("Species", &config.species);
    cli::kv("Genome", &config.genome_name);
    cli::kv("Package", &config.package_dir.display().to_string());
    cli::kv("Output", &genome_dir.display().to_string());

    // The annotation path requires exactly one table in the package
    let gtf_path = find_annotation_table(&config.package_dir)?;
    cli::kv("Annotation", &gtf_path.display().to_string());

    eprintln!();

    // ── Sequences ────────────────────────────────────────
    cli::section("Sequences");

    let sequences = import_sequences(&config.package_dir, &genome_dir)
        .context("sequence import failed")?;
    let total_bases: u64 = sequences.iter().map(|i| i.end - i.start).sum();
    cli::kv("Chromosomes", &sequences.len().to_string());
    cli::kv("Bases", &total_bases.to_string());
    cli::kv("Blob size", &cli::format_bytes(total_bases));
    cli::success("sequence blobs written");

    eprintln!();

    // ── Annotation ───────────────────────────────────────
    cli::section("Annotation");

    let mut genome = Genome::new(&config.species, &config.genome_name);
    let (registry, stats) =
        annotation::import_annotation_table(&gtf_path, &sequences, &mut genome)
            .context("annotation import failed")?;

    cli::kv("Rows", &stats.rows_total.to_string());
    cli::kv("Genes", &registry.gene_count().to_string());
    cli::kv("Transcripts", &registry.transcript_count().to_string());
    cli::kv("Proteins", &registry.protein_count().to_string());
    cli::kv("Exons", &registry.exon_count().to_string());
    if stats.rows_skipped_unknown_chromosome > 0 {
        cli::warning(&format!(
            "{} rows referenced chromosomes outside the imported set",
            stats.rows_skipped_unknown_chromosome
        ));
    }
    if stats.rows_ignored_feature > 0 {
        cli::kv("Ignored features", &stats.rows_ignored_feature.to_string());
    }

    eprintln!();

    // ── Gene-symbol index ────────────────────────────────
    cli::section("Gene-symbol index");

    let index_stats = build_symbol_index(&gtf_path, &gene_sets_dir)
        .context("symbol index build failed")?;
    cli::kv("Partitions", &index_stats.chromosomes.to_string());
    cli::kv("Symbols", &index_stats.symbols.to_string());
    cli::success(&format!("index written to {}", gene_sets_dir.display()));

    eprintln!();

    // ── Provenance ───────────────────────────────────────
    cli::section("Provenance");

    let provenance_path = genome_dir.join("genome_build.txt");
    write_genome_provenance(&provenance_path, &genome, &registry, &stats, &sequences)?;
    cli::kv("Dataset id", &format!("0x{:08X}", genome.dataset_id()));
    cli::success(&format!("written to {}", provenance_path.display()));

    cli::print_summary(start);
    Ok(())
}

/// Locate the package's annotation table; exactly one `.gtf` must exist.
fn find_annotation_table(package_dir: &Path) -> Result<PathBuf> {
    let mut tables: Vec<PathBuf> = fs::read_dir(package_dir)
        .with_context(|| format!("cannot read package directory: {}", package_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "gtf"))
        .collect();
    if tables.len() != 1 {
        bail!(
            "the package must contain exactly one .gtf annotation table, found {} in {}",
            tables.len(),
            package_dir.display()
        );
    }
    Ok(tables.remove(0))
}

fn write_genome_provenance(
    path: &Path,
    genome: &Genome,
    registry: &Registry,
    stats: &ImportStats,
    sequences: &SequenceSet,
) -> Result<()> {
    let mut f = File::create(path)
        .with_context(|| format!("cannot create provenance file: {}", path.display()))?;
    writeln!(f, "dataset: {}/{}", genome.species, genome.name)?;
    writeln!(f, "dataset id: 0x{:08X}", genome.dataset_id())?;
    if let Some(ref source) = genome.annotation_source {
        writeln!(f, "annotation source: {}", source.display())?;
    }
    writeln!(f, "chromosomes: {}", sequences.len())?;
    writeln!(f, "genes: {}", registry.gene_count())?;
    writeln!(f, "transcripts: {}", registry.transcript_count())?;
    writeln!(f, "proteins: {}", registry.protein_count())?;
    writeln!(f, "exons: {}", registry.exon_count())?;
    writeln!(f, "annotation rows: {}", stats.rows_total)?;
    writeln!(
        f,
        "rows discarded (unknown chromosome): {}",
        stats.rows_skipped_unknown_chromosome
    )?;
    writeln!(
        f,
        "rows ignored (unrecognized feature): {}",
        stats.rows_ignored_feature
    )?;
    Ok(())
}
