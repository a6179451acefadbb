//! GTF data structures: one parsed annotation row.

use std::collections::HashMap;

use crate::error::Error;
use crate::strand::Strand;

/// Feature type of a GTF row.
///
/// Only the four types driving the entity graph are distinguished; every
/// other feature is carried as `Other` and ignored by the importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    Exon,
    Cds,
    StartCodon,
    StopCodon,
    Other(String),
}

impl Feature {
    #[must_use]
    pub fn from_gtf(s: &str) -> Self {
        match s {
            "exon" => Self::Exon,
            "CDS" => Self::Cds,
            "start_codon" => Self::StartCodon,
            "stop_codon" => Self::StopCodon,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A single parsed GTF row.
///
/// Coordinates are kept exactly as they appear in the file (1-based,
/// inclusive); conversion happens when entities are created.
#[derive(Debug, Clone)]
pub struct GtfRow {
    pub chromosome: String,
    pub source: String,
    pub feature: Feature,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    attributes: HashMap<String, String>,
}

impl GtfRow {
    #[must_use]
    pub fn new(
        chromosome: String,
        source: String,
        feature: Feature,
        start: i64,
        end: i64,
        strand: Strand,
        attributes: HashMap<String, String>,
    ) -> Self {
        Self {
            chromosome,
            source,
            feature,
            start,
            end,
            strand,
            attributes,
        }
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Look up a required attribute; absence is a field-access failure.
    pub fn require(&self, key: &str) -> Result<&str, Error> {
        self.attr(key).ok_or_else(|| {
            Error::FieldExtraction(format!(
                "row {}:{}-{} is missing required attribute '{key}'",
                self.chromosome, self.start, self.end
            ))
        })
    }
}
