//! Relation resolver: second pass attaching child collections.
//!
//! Entities are discovered in row order, which interleaves genes,
//! transcripts, and exons arbitrarily, so complete child sets only exist
//! once the whole table has been consumed. This pass runs the registry's
//! query-by-filter surface for every parent and assigns the results:
//! exons per transcript, transcripts and exons per gene, genes per
//! chromosome, and the chromosome order onto the genome.

use crate::genome::Genome;

use super::registry::Registry;

pub fn resolve_relations(registry: &mut Registry, genome: &mut Genome) {
    let transcript_exons: Vec<Vec<usize>> = (0..registry.transcript_count())
        .map(|i| registry.exons_by_transcript(&registry.transcript(i).id))
        .collect();
    for (i, exons) in transcript_exons.into_iter().enumerate() {
        registry.transcript_mut(i).exons = exons;
    }

    let gene_children: Vec<(Vec<usize>, Vec<usize>)> = (0..registry.gene_count())
        .map(|i| {
            let id = &registry.gene(i).id;
            (registry.transcripts_by_gene(id), registry.exons_by_gene(id))
        })
        .collect();
    for (i, (transcripts, exons)) in gene_children.into_iter().enumerate() {
        let gene = registry.gene_mut(i);
        gene.transcripts = transcripts;
        gene.exons = exons;
    }

    let chromosome_genes: Vec<Vec<usize>> = (0..registry.chromosome_count())
        .map(|i| registry.genes_by_chromosome(&registry.chromosome(i).label))
        .collect();
    for (i, genes) in chromosome_genes.into_iter().enumerate() {
        registry.chromosome_mut(i).genes = genes;
    }

    genome.chromosomes = (0..registry.chromosome_count()).collect();
}
