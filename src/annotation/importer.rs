//! Annotation importer: first pass over the GTF row stream.
//!
//! Consumes rows strictly in input order, lazily creating chromosome,
//! gene, transcript, and protein records on first encounter of their
//! identifiers, and merging `CDS`/`start_codon`/`stop_codon` rows into the
//! exon records created by earlier `exon` rows. Rows referencing a
//! chromosome outside the imported sequence set are discarded and counted;
//! that filtering is intentional, not an error.

use crate::chromosome::Chromosome;
use crate::error::Error;
use crate::gtf::{Feature, GtfRow, GtfTable};
use crate::sequence::SequenceSet;

use super::entities::{Exon, ExonKey, Gene, Protein, Transcript};
use super::registry::Registry;

/// Row-discard counters surfaced in the provenance output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportStats {
    pub rows_total: usize,
    pub rows_skipped_unknown_chromosome: usize,
    pub rows_ignored_feature: usize,
}

/// Run the entity-creation pass over a parsed annotation table.
///
/// The registry must be empty; on error the partial registry is discarded
/// by the caller (no partial commit).
pub fn import_rows(
    table: &GtfTable,
    sequences: &SequenceSet,
    registry: &mut Registry,
) -> Result<ImportStats, Error> {
    let mut stats = ImportStats::default();

    for row in table.iter() {
        stats.rows_total += 1;

        let label = &row.chromosome;
        let Some(info) = sequences.get(label) else {
            stats.rows_skipped_unknown_chromosome += 1;
            continue;
        };

        if registry.chromosome_index(label).is_none() {
            registry.insert_chromosome(Chromosome {
                label: label.clone(),
                header: info.header.clone(),
                sequence_start: info.start,
                sequence_end: info.end,
                genes: Vec::new(),
            })?;
        }

        let gene_id = row.require("gene_id")?;
        if registry.gene_index(gene_id).is_none() {
            registry.insert_gene(Gene {
                id: gene_id.to_string(),
                name: row.require("gene_name")?.to_string(),
                strand: row.strand,
                biotype: row.require("gene_biotype")?.to_string(),
                chromosome: label.clone(),
                transcripts: Vec::new(),
                exons: Vec::new(),
            })?;
        }

        let transcript_id = row.require("transcript_id")?;
        if registry.transcript_index(transcript_id).is_none() {
            let transcript_name = row.require("transcript_name")?;
            // Non-coding transcripts carry no protein_id; the transcript id
            // stands in so the 1:1 pairing holds for every transcript.
            let protein_id = row.attr("protein_id").unwrap_or(transcript_id);
            let protein_index = match registry.protein_index(protein_id) {
                Some(index) => index,
                None => registry.insert_protein(Protein {
                    id: protein_id.to_string(),
                    name: transcript_name.to_string(),
                    transcript_id: transcript_id.to_string(),
                    gene_id: gene_id.to_string(),
                    chromosome: label.clone(),
                })?,
            };
            registry.insert_transcript(Transcript {
                id: transcript_id.to_string(),
                name: transcript_name.to_string(),
                gene_id: gene_id.to_string(),
                chromosome: label.clone(),
                protein: protein_index,
                exons: Vec::new(),
            })?;
        }

        match &row.feature {
            Feature::Exon => {
                let key = ExonKey::from_row(row);
                if registry.exon_index(&key).is_none() {
                    let number: u32 = row.require("exon_number")?.parse().map_err(|e| {
                        Error::Parse(format!(
                            "invalid exon_number '{}': {e}",
                            row.attr("exon_number").unwrap_or_default()
                        ))
                    })?;
                    registry.insert_exon(Exon {
                        key,
                        number,
                        start: row.start - 1,
                        end: row.end,
                        strand: row.strand,
                        biotype: row.require("gene_biotype")?.to_string(),
                        cds: None,
                        start_codon: None,
                        stop_codon: None,
                        transcript_id: transcript_id.to_string(),
                        gene_id: gene_id.to_string(),
                        chromosome: label.clone(),
                    })?;
                }
            }
            Feature::Cds => {
                let exon = resolve_exon(registry, row, "CDS")?;
                exon.cds = Some((row.start - 1, row.end));
            }
            Feature::StartCodon => {
                let exon = resolve_exon(registry, row, "start_codon")?;
                exon.start_codon = Some(row.start - 1);
            }
            Feature::StopCodon => {
                let exon = resolve_exon(registry, row, "stop_codon")?;
                exon.stop_codon = Some(row.end);
            }
            Feature::Other(_) => {
                stats.rows_ignored_feature += 1;
            }
        }
    }

    Ok(stats)
}

/// Look up the exon a mutation row refers to.
///
/// Rows are not pre-sorted by feature type, but the creating `exon` row
/// must already have been processed; a miss means the upstream table is
/// inconsistent and the run cannot safely continue.
fn resolve_exon<'r>(
    registry: &'r mut Registry,
    row: &GtfRow,
    feature: &str,
) -> Result<&'r mut Exon, Error> {
    let key = ExonKey::from_row(row);
    let index = registry.exon_index(&key).ok_or_else(|| {
        Error::MissingReference(format!(
            "{feature} row at {}:{}-{} precedes its exon ({key})",
            row.chromosome, row.start, row.end
        ))
    })?;
    Ok(registry.exon_mut(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{ChromosomeInfo, SequenceSet};
    use std::io::Cursor;

    fn sequences() -> SequenceSet {
        SequenceSet::from_infos(vec![ChromosomeInfo {
            label: "1".to_string(),
            header: ">chr1".to_string(),
            start: 0,
            end: 1_000_000,
        }])
    }

    fn import(gtf: &str) -> Result<(Registry, ImportStats), Error> {
        let table = GtfTable::from_reader(Cursor::new(gtf))?;
        let mut registry = Registry::new();
        let stats = import_rows(&table, &sequences(), &mut registry)?;
        Ok((registry, stats))
    }

    const ATTRS: &str = "gene_id \"G1\"; gene_name \"SGIP1\"; gene_biotype \"protein_coding\"; transcript_id \"T1\"; transcript_name \"SGIP1-201\";";

    #[test]
    fn exon_then_cds_merges_into_one_exon() {
        let gtf = format!(
            "1\tsrc\texon\t100\t200\t.\t+\t.\t{ATTRS} exon_number \"1\"; exon_id \"E1\";\n\
             1\tsrc\tCDS\t100\t200\t.\t+\t.\t{ATTRS} exon_id \"E1\"; protein_id \"P1\";\n"
        );
        let (registry, _) = import(&gtf).unwrap();
        assert_eq!(registry.exon_count(), 1);
        let exon = registry.exon(0);
        // 0-based half-open: GTF 100-200 becomes [99, 200)
        assert_eq!((exon.start, exon.end), (99, 200));
        assert_eq!(exon.cds, Some((99, 200)));
        assert_eq!(exon.number, 1);
    }

    #[test]
    fn span_key_fallback_without_exon_id() {
        let gtf = format!(
            "1\tsrc\texon\t100\t200\t.\t+\t.\t{ATTRS} exon_number \"1\";\n\
             1\tsrc\tCDS\t100\t200\t.\t+\t.\t{ATTRS}\n"
        );
        let (registry, _) = import(&gtf).unwrap();
        assert_eq!(registry.exon_count(), 1);
        assert_eq!(registry.exon(0).cds, Some((99, 200)));
    }

    #[test]
    fn cds_span_lies_within_exon_span() {
        let gtf = format!(
            "1\tsrc\texon\t100\t500\t.\t+\t.\t{ATTRS} exon_number \"1\"; exon_id \"E1\";\n\
             1\tsrc\tCDS\t160\t400\t.\t+\t.\t{ATTRS} exon_id \"E1\"; protein_id \"P1\";\n"
        );
        let (registry, _) = import(&gtf).unwrap();
        let exon = registry.exon(0);
        let (cds_start, cds_end) = exon.cds.unwrap();
        assert!(cds_start <= cds_end);
        assert!(exon.start <= cds_start && cds_end <= exon.end);
    }

    #[test]
    fn codon_rows_set_single_coordinates() {
        let gtf = format!(
            "1\tsrc\texon\t100\t200\t.\t+\t.\t{ATTRS} exon_number \"1\"; exon_id \"E1\";\n\
             1\tsrc\tstart_codon\t100\t102\t.\t+\t.\t{ATTRS} exon_id \"E1\";\n\
             1\tsrc\tstop_codon\t198\t200\t.\t+\t.\t{ATTRS} exon_id \"E1\";\n"
        );
        let (registry, _) = import(&gtf).unwrap();
        let exon = registry.exon(0);
        assert_eq!(exon.start_codon, Some(99));
        assert_eq!(exon.stop_codon, Some(200));
    }

    #[test]
    fn cds_before_exon_is_missing_reference() {
        let gtf = format!("1\tsrc\tCDS\t100\t200\t.\t+\t.\t{ATTRS} exon_id \"E1\";\n");
        let err = import(&gtf).unwrap_err();
        assert!(matches!(err, Error::MissingReference(_)));
    }

    #[test]
    fn transcript_and_protein_co_created() {
        let gtf = format!("1\tsrc\texon\t100\t200\t.\t+\t.\t{ATTRS} exon_number \"1\";\n");
        let (registry, _) = import(&gtf).unwrap();
        assert_eq!(registry.transcript_count(), 1);
        assert_eq!(registry.protein_count(), 1);
        let transcript = registry.transcript(0);
        let protein = registry.protein(transcript.protein);
        // No protein_id attribute: transcript id stands in
        assert_eq!(protein.id, "T1");
        assert_eq!(protein.name, "SGIP1-201");
        assert_eq!(protein.gene_id, transcript.gene_id);
    }

    #[test]
    fn first_occurrence_defines_gene() {
        let gtf = "\
1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"G1\"; gene_name \"FIRST\"; gene_biotype \"protein_coding\"; transcript_id \"T1\"; transcript_name \"N1\"; exon_number \"1\"; exon_id \"E1\";
1\tsrc\texon\t300\t400\t.\t+\t.\tgene_id \"G1\"; gene_name \"SECOND\"; gene_biotype \"pseudogene\"; transcript_id \"T2\"; transcript_name \"N2\"; exon_number \"1\"; exon_id \"E2\";
";
        let (registry, _) = import(gtf).unwrap();
        assert_eq!(registry.gene_count(), 1);
        assert_eq!(registry.gene(0).name, "FIRST");
        assert_eq!(registry.gene(0).biotype, "protein_coding");
        assert_eq!(registry.transcript_count(), 2);
    }

    #[test]
    fn unknown_chromosome_rows_discarded_and_counted() {
        let gtf = format!(
            "7\tsrc\texon\t100\t200\t.\t+\t.\t{ATTRS} exon_number \"1\";\n\
             1\tsrc\texon\t100\t200\t.\t+\t.\t{ATTRS} exon_number \"1\";\n"
        );
        let (registry, stats) = import(&gtf).unwrap();
        assert_eq!(stats.rows_total, 2);
        assert_eq!(stats.rows_skipped_unknown_chromosome, 1);
        assert_eq!(registry.chromosome_count(), 1);
        assert_eq!(registry.exon_count(), 1);
    }

    #[test]
    fn unrecognized_feature_ignored_and_counted() {
        let gtf = format!("1\tsrc\tfive_prime_utr\t100\t200\t.\t+\t.\t{ATTRS}\n");
        let (registry, stats) = import(&gtf).unwrap();
        assert_eq!(stats.rows_ignored_feature, 1);
        assert_eq!(registry.exon_count(), 0);
        // The row still defines its gene and transcript
        assert_eq!(registry.gene_count(), 1);
    }

    #[test]
    fn missing_required_attribute_is_fatal() {
        let gtf = "1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"G1\";\n";
        let err = import(gtf).unwrap_err();
        assert!(matches!(err, Error::FieldExtraction(_)));
    }

    #[test]
    fn chromosome_offsets_copied_from_sequence_pass() {
        let gtf = format!("1\tsrc\texon\t100\t200\t.\t+\t.\t{ATTRS} exon_number \"1\";\n");
        let (registry, _) = import(&gtf).unwrap();
        let chromosome = registry.chromosome(0);
        assert_eq!(chromosome.sequence_start, 0);
        assert_eq!(chromosome.sequence_end, 1_000_000);
        assert_eq!(chromosome.header, ">chr1");
    }
}
