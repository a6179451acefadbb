use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Run manifest for a genome import (sequences + annotation).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenomeImportConfig {
    pub species: String,
    pub genome_name: String,
    /// Directory containing one `chr<label>.fa` per chromosome and exactly
    /// one `.gtf` annotation table.
    pub package_dir: PathBuf,
}

impl GenomeImportConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        validate_component("species", &config.species)?;
        validate_component("genomeName", &config.genome_name)?;
        Ok(config)
    }
}

/// Run manifest for a dbSNP import.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbsnpImportConfig {
    pub species: String,
    /// Name under which this dbSNP release is stored, e.g. "dbSNP137".
    pub version_name: String,
    /// Directory containing the `*.flat.gz` dump files.
    pub package_dir: PathBuf,
    /// Assembly tag selecting which CTG line to read positions from.
    #[serde(default = "default_assembly_tag")]
    pub assembly_tag: String,
}

fn default_assembly_tag() -> String {
    "GRCh".to_string()
}

impl DbsnpImportConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        validate_component("species", &config.species)?;
        validate_component("versionName", &config.version_name)?;
        if config.assembly_tag.is_empty() {
            bail!("assemblyTag must not be empty");
        }
        Ok(config)
    }
}

/// Directory layout of the output dataset.
///
/// All paths are derived from a single data root:
/// `<root>/<species>/genomes/<genome>/`, `<root>/<species>/gene_sets/<genome>/`
/// and `<root>/<species>/dbSNP/<version>/`.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
    species: String,
}

impl DataLayout {
    #[must_use]
    pub fn new(root: &Path, species: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            species: species.to_string(),
        }
    }

    #[must_use]
    pub fn genome_dir(&self, genome_name: &str) -> PathBuf {
        self.root
            .join(&self.species)
            .join("genomes")
            .join(genome_name)
    }

    #[must_use]
    pub fn gene_sets_dir(&self, genome_name: &str) -> PathBuf {
        self.root
            .join(&self.species)
            .join("gene_sets")
            .join(genome_name)
    }

    #[must_use]
    pub fn dbsnp_dir(&self, version_name: &str) -> PathBuf {
        self.root
            .join(&self.species)
            .join("dbSNP")
            .join(version_name)
    }
}

/// Names become directory components, so path separators are rejected.
fn validate_component(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        bail!("{name} must not be empty");
    }
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        bail!("{name} must be a plain name, got '{value}'");
    }
    Ok(())
}
