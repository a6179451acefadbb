//! Genopack: genomics reference data importer.
//!
//! Converts raw reference packages (per-chromosome sequence files, GTF
//! annotation tables, and dbSNP variant dumps) into a normalized,
//! offset-indexed on-disk dataset for downstream genome-analysis tooling.

pub mod error;

pub mod annotation;
pub mod casava;
pub mod chromosome;
pub mod cli;
pub mod config;
pub mod dbsnp;
pub mod genome;
pub mod gtf;
pub mod nucleotide;
pub mod sequence;
pub mod strand;
pub mod symbol_index;
pub mod table;
