//! Run-scoped entity registry.
//!
//! Entities live in per-kind `Vec`s with identifier → index maps on top,
//! so indices stay stable for the lifetime of a run and child collections
//! can reference entities cheaply. The registry is created for one import,
//! passed through the passes, and dropped with the run; nothing survives
//! between runs.
//!
//! The `*_by_*` methods are the query-by-filter surface the relation
//! resolver runs against: exact match on a named back-reference field, in
//! first-seen order.

use std::collections::HashMap;

use crate::chromosome::Chromosome;
use crate::error::Error;

use super::entities::{Exon, ExonKey, Gene, Protein, Transcript};

#[derive(Debug, Default)]
pub struct Registry {
    chromosomes: Vec<Chromosome>,
    chromosome_ids: HashMap<String, usize>,
    genes: Vec<Gene>,
    gene_ids: HashMap<String, usize>,
    transcripts: Vec<Transcript>,
    transcript_ids: HashMap<String, usize>,
    proteins: Vec<Protein>,
    protein_ids: HashMap<String, usize>,
    exons: Vec<Exon>,
    exon_keys: HashMap<ExonKey, usize>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── create-entity ────────────────────────────────────

    pub fn insert_chromosome(&mut self, chromosome: Chromosome) -> Result<usize, Error> {
        if self.chromosome_ids.contains_key(&chromosome.label) {
            return Err(Error::Parse(format!(
                "duplicate chromosome: {}",
                chromosome.label
            )));
        }
        let index = self.chromosomes.len();
        self.chromosome_ids.insert(chromosome.label.clone(), index);
        self.chromosomes.push(chromosome);
        Ok(index)
    }

    pub fn insert_gene(&mut self, gene: Gene) -> Result<usize, Error> {
        if self.gene_ids.contains_key(&gene.id) {
            return Err(Error::Parse(format!("duplicate gene id: {}", gene.id)));
        }
        let index = self.genes.len();
        self.gene_ids.insert(gene.id.clone(), index);
        self.genes.push(gene);
        Ok(index)
    }

    pub fn insert_transcript(&mut self, transcript: Transcript) -> Result<usize, Error> {
        if self.transcript_ids.contains_key(&transcript.id) {
            return Err(Error::Parse(format!(
                "duplicate transcript id: {}",
                transcript.id
            )));
        }
        let index = self.transcripts.len();
        self.transcript_ids.insert(transcript.id.clone(), index);
        self.transcripts.push(transcript);
        Ok(index)
    }

    pub fn insert_protein(&mut self, protein: Protein) -> Result<usize, Error> {
        if self.protein_ids.contains_key(&protein.id) {
            return Err(Error::Parse(format!(
                "duplicate protein id: {}",
                protein.id
            )));
        }
        let index = self.proteins.len();
        self.protein_ids.insert(protein.id.clone(), index);
        self.proteins.push(protein);
        Ok(index)
    }

    pub fn insert_exon(&mut self, exon: Exon) -> Result<usize, Error> {
        if self.exon_keys.contains_key(&exon.key) {
            return Err(Error::Parse(format!("duplicate exon key: {}", exon.key)));
        }
        let index = self.exons.len();
        self.exon_keys.insert(exon.key.clone(), index);
        self.exons.push(exon);
        Ok(index)
    }

    // ── lookup by identity ───────────────────────────────

    #[must_use]
    pub fn chromosome_index(&self, label: &str) -> Option<usize> {
        self.chromosome_ids.get(label).copied()
    }

    #[must_use]
    pub fn gene_index(&self, id: &str) -> Option<usize> {
        self.gene_ids.get(id).copied()
    }

    #[must_use]
    pub fn transcript_index(&self, id: &str) -> Option<usize> {
        self.transcript_ids.get(id).copied()
    }

    #[must_use]
    pub fn protein_index(&self, id: &str) -> Option<usize> {
        self.protein_ids.get(id).copied()
    }

    #[must_use]
    pub fn exon_index(&self, key: &ExonKey) -> Option<usize> {
        self.exon_keys.get(key).copied()
    }

    // ── direct access ────────────────────────────────────

    #[must_use]
    pub fn chromosome(&self, index: usize) -> &Chromosome {
        &self.chromosomes[index]
    }

    pub fn chromosome_mut(&mut self, index: usize) -> &mut Chromosome {
        &mut self.chromosomes[index]
    }

    #[must_use]
    pub fn gene(&self, index: usize) -> &Gene {
        &self.genes[index]
    }

    pub fn gene_mut(&mut self, index: usize) -> &mut Gene {
        &mut self.genes[index]
    }

    #[must_use]
    pub fn transcript(&self, index: usize) -> &Transcript {
        &self.transcripts[index]
    }

    pub fn transcript_mut(&mut self, index: usize) -> &mut Transcript {
        &mut self.transcripts[index]
    }

    #[must_use]
    pub fn protein(&self, index: usize) -> &Protein {
        &self.proteins[index]
    }

    #[must_use]
    pub fn exon(&self, index: usize) -> &Exon {
        &self.exons[index]
    }

    pub fn exon_mut(&mut self, index: usize) -> &mut Exon {
        &mut self.exons[index]
    }

    #[must_use]
    pub fn chromosome_count(&self) -> usize {
        self.chromosomes.len()
    }

    #[must_use]
    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    #[must_use]
    pub fn transcript_count(&self) -> usize {
        self.transcripts.len()
    }

    #[must_use]
    pub fn protein_count(&self) -> usize {
        self.proteins.len()
    }

    #[must_use]
    pub fn exon_count(&self) -> usize {
        self.exons.len()
    }

    // ── query-by-filter ──────────────────────────────────

    #[must_use]
    pub fn exons_by_transcript(&self, transcript_id: &str) -> Vec<usize> {
        self.filter_exons(|e| e.transcript_id == transcript_id)
    }

    #[must_use]
    pub fn exons_by_gene(&self, gene_id: &str) -> Vec<usize> {
        self.filter_exons(|e| e.gene_id == gene_id)
    }

    #[must_use]
    pub fn transcripts_by_gene(&self, gene_id: &str) -> Vec<usize> {
        self.transcripts
            .iter()
            .enumerate()
            .filter(|(_, t)| t.gene_id == gene_id)
            .map(|(i, _)| i)
            .collect()
    }

    #[must_use]
    pub fn genes_by_chromosome(&self, label: &str) -> Vec<usize> {
        self.genes
            .iter()
            .enumerate()
            .filter(|(_, g)| g.chromosome == label)
            .map(|(i, _)| i)
            .collect()
    }

    fn filter_exons(&self, predicate: impl Fn(&Exon) -> bool) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .exons
            .iter()
            .enumerate()
            .filter(|(_, e)| predicate(e))
            .map(|(i, _)| i)
            .collect();
        // Exon collections are ordered by genomic span
        indices.sort_by_key(|&i| (self.exons[i].start, self.exons[i].end));
        indices
    }
}
