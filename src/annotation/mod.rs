//! Annotation import: GTF rows → linked entity graph.
//!
//! Two passes over a run-scoped registry: `importer` creates entities in
//! row order, `linker` attaches child collections once every node exists
//! (foreign keys may appear before their target row, so the graph cannot
//! be fully linked incrementally).

pub mod entities;
pub mod importer;
pub mod linker;
pub mod registry;

use std::path::Path;

use crate::error::Error;
use crate::genome::Genome;
use crate::gtf::GtfTable;
use crate::sequence::SequenceSet;

pub use entities::{Exon, ExonKey, Gene, Protein, Transcript};
pub use importer::ImportStats;
pub use registry::Registry;

/// Import an annotation table and resolve all relations.
///
/// Returns the populated registry and the discard counters. On error the
/// run is aborted with nothing committed; the genome records the
/// annotation source path for provenance.
pub fn import_annotation_table(
    gtf_path: &Path,
    sequences: &SequenceSet,
    genome: &mut Genome,
) -> Result<(Registry, ImportStats), Error> {
    let table = GtfTable::from_path(gtf_path)?;
    let mut registry = Registry::new();
    let stats = importer::import_rows(&table, sequences, &mut registry)?;
    linker::resolve_relations(&mut registry, genome);
    genome.annotation_source = Some(gtf_path.to_path_buf());
    Ok((registry, stats))
}
