//! Entity records built by the annotation importer.
//!
//! Ownership is tree-shaped: chromosome → gene → transcript → protein/exon.
//! Back-references are identifiers; child collections hold registry indices
//! and are assigned by the relation resolver after the row pass.

use std::fmt;

use crate::gtf::GtfRow;
use crate::strand::Strand;

/// A gene, created on the first row carrying an unseen `gene_id`.
#[derive(Debug, Clone)]
pub struct Gene {
    pub id: String,
    pub name: String,
    pub strand: Strand,
    pub biotype: String,
    pub chromosome: String,
    pub transcripts: Vec<usize>,
    /// Union of exons across this gene's transcripts.
    pub exons: Vec<usize>,
}

/// A transcript, created on the first row carrying an unseen
/// `transcript_id`. Its protein is created in the same step.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub id: String,
    pub name: String,
    pub gene_id: String,
    pub chromosome: String,
    /// Registry index of the co-created protein.
    pub protein: usize,
    pub exons: Vec<usize>,
}

/// A protein, co-created with its transcript (1:1).
#[derive(Debug, Clone)]
pub struct Protein {
    pub id: String,
    /// Defaults to the transcript name.
    pub name: String,
    pub transcript_id: String,
    pub gene_id: String,
    pub chromosome: String,
}

/// Identity of an exon record.
///
/// The explicit `exon_id` attribute when the row carries one, otherwise the
/// (chromosome, start, end) span of the row. The same derivation is applied
/// to the creating `exon` row and to every `CDS`/codon mutation row, so a
/// row pair only matches when their keys derive identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExonKey {
    Id(String),
    Span {
        chromosome: String,
        start: i64,
        end: i64,
    },
}

impl ExonKey {
    /// Derive the key for a row, preferring the explicit id.
    #[must_use]
    pub fn from_row(row: &GtfRow) -> Self {
        match row.attr("exon_id") {
            Some(id) => Self::Id(id.to_string()),
            None => Self::Span {
                chromosome: row.chromosome.clone(),
                start: row.start,
                end: row.end,
            },
        }
    }
}

impl fmt::Display for ExonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "exon id {id}"),
            Self::Span {
                chromosome,
                start,
                end,
            } => write!(f, "exon span {chromosome}:{start}-{end}"),
        }
    }
}

/// An exon, created by an `exon` feature row and mutated in place by later
/// `CDS`/`start_codon`/`stop_codon` rows resolving to the same key.
///
/// Coordinates are 0-based half-open: `start`/`cds.0`/`start_codon` are
/// inclusive starts, `end`/`cds.1`/`stop_codon` exclusive ends.
#[derive(Debug, Clone)]
pub struct Exon {
    pub key: ExonKey,
    pub number: u32,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub biotype: String,
    pub cds: Option<(i64, i64)>,
    pub start_codon: Option<i64>,
    pub stop_codon: Option<i64>,
    pub transcript_id: String,
    pub gene_id: String,
    pub chromosome: String,
}
