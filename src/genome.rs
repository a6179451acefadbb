//! Genome identity and dataset id computation.

use std::path::PathBuf;

/// Top-level record for one imported genome.
///
/// Holds run provenance and, after relation resolution, the ordered list of
/// chromosome registry indices. The annotation source path is recorded so
/// downstream tooling can trace where a dataset came from.
#[derive(Debug)]
pub struct Genome {
    pub species: String,
    pub name: String,
    pub annotation_source: Option<PathBuf>,
    pub chromosomes: Vec<usize>,
}

impl Genome {
    #[must_use]
    pub fn new(species: &str, name: &str) -> Self {
        Self {
            species: species.to_string(),
            name: name.to_string(),
            annotation_source: None,
            chromosomes: Vec::new(),
        }
    }

    /// Deterministic 32-bit dataset id derived from `<species>/<name>`.
    ///
    /// The id is the first 4 bytes (LE) of the SHA-256 hash of the pair.
    /// Downstream files embed it for quick compatibility checks against
    /// the dataset they were built from.
    #[must_use]
    pub fn dataset_id(&self) -> u32 {
        use sha2::{Digest, Sha256};
        let input = format!("{}/{}", self.species, self.name);
        let hash = Sha256::digest(input.as_bytes());
        u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]])
    }
}
