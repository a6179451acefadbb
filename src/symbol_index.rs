//! Gene-symbol index builder.
//!
//! Partitions a raw annotation table by chromosome and, within each
//! partition, maps every gene symbol to the contiguous line range holding
//! its rows, so a gene's annotation can be fetched without a full-table
//! scan. Rows are assumed grouped by chromosome; partitions are detected
//! by change of the chromosome column and each partition is fully flushed
//! before the next one starts.
//!
//! Schema assumption: the symbol is the `gene_name` attribute of GTF
//! column 9, extracted with the key-value attribute parser.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::gtf::parser::gene_symbol;

/// Half-open line range `[start, end)` within a partition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

/// Symbol → line-range index for one chromosome partition.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SymbolIndex(BTreeMap<String, LineRange>);

impl SymbolIndex {
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<LineRange> {
        self.0.get(symbol).copied()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Parse(format!("invalid symbol index {}: {e}", path.display())))
    }

    fn save(&self, path: &Path) -> Result<(), Error> {
        let mut file = File::create(path)?;
        serde_json::to_writer(&mut file, self)
            .map_err(|e| Error::Parse(format!("cannot serialize symbol index: {e}")))?;
        file.flush()?;
        Ok(())
    }
}

/// Path of a chromosome's partition table under `out_dir`.
#[must_use]
pub fn partition_path(out_dir: &Path, label: &str) -> PathBuf {
    out_dir.join(format!("chr{label}.gtf"))
}

/// Path of a chromosome's serialized symbol index under `out_dir`.
#[must_use]
pub fn index_path(out_dir: &Path, label: &str) -> PathBuf {
    out_dir.join(format!("chr{label}_gene_symbols.index.json"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SymbolIndexStats {
    pub chromosomes: usize,
    pub symbols: usize,
    pub rows: usize,
}

/// One in-progress chromosome partition.
struct Partition {
    label: String,
    lines: Vec<String>,
    index: SymbolIndex,
    current_symbol: Option<String>,
    symbol_start: usize,
}

impl Partition {
    fn new(label: String) -> Self {
        Self {
            label,
            lines: Vec::new(),
            index: SymbolIndex::default(),
            current_symbol: None,
            symbol_start: 0,
        }
    }

    fn push(&mut self, line: String, symbol: String) {
        if self.current_symbol.as_deref() != Some(symbol.as_str()) {
            self.close_symbol();
            self.current_symbol = Some(symbol);
            self.symbol_start = self.lines.len();
        }
        self.lines.push(line);
    }

    fn close_symbol(&mut self) {
        if let Some(symbol) = self.current_symbol.take() {
            self.index.0.insert(
                symbol,
                LineRange {
                    start: self.symbol_start,
                    end: self.lines.len(),
                },
            );
        }
    }

    fn flush(mut self, out_dir: &Path, stats: &mut SymbolIndexStats) -> Result<(), Error> {
        self.close_symbol();

        let mut table = File::create(partition_path(out_dir, &self.label))?;
        for line in &self.lines {
            writeln!(table, "{line}")?;
        }
        table.flush()?;

        self.index.save(&index_path(out_dir, &self.label))?;

        stats.chromosomes += 1;
        stats.symbols += self.index.len();
        stats.rows += self.lines.len();
        Ok(())
    }
}

/// Partition `gtf_path` by chromosome and build one symbol index per
/// partition under `out_dir`.
///
/// A chromosome label that reappears after its partition was flushed means
/// the input is not grouped by chromosome, which would silently overwrite
/// the earlier partition; that is a structural error.
pub fn build_symbol_index(gtf_path: &Path, out_dir: &Path) -> Result<SymbolIndexStats, Error> {
    fs::create_dir_all(out_dir)?;

    let file = File::open(gtf_path)?;
    let reader = BufReader::new(file);

    let mut stats = SymbolIndexStats::default();
    let mut flushed: HashSet<String> = HashSet::new();
    let mut partition: Option<Partition> = None;

    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let label = line
            .split('\t')
            .next()
            .unwrap_or_default()
            .to_string();
        let symbol = gene_symbol(&line)?;

        let boundary = partition
            .as_ref()
            .is_none_or(|p| p.label != label);
        if boundary {
            if let Some(done) = partition.take() {
                flushed.insert(done.label.clone());
                done.flush(out_dir, &mut stats)?;
            }
            if flushed.contains(&label) {
                return Err(Error::Structural(format!(
                    "chromosome {label} reappears after its partition was flushed; \
                     input rows must be grouped by chromosome"
                )));
            }
            partition = Some(Partition::new(label.clone()));
        }
        partition
            .as_mut()
            .expect("partition opened above")
            .push(line, symbol);
    }

    if let Some(done) = partition.take() {
        done.flush(out_dir, &mut stats)?;
    }

    let mut infos = File::create(out_dir.join("build_infos.txt"))?;
    writeln!(infos, "source file: {}", gtf_path.display())?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(chromosome: &str, symbol: &str, start: i64) -> String {
        format!(
            "{chromosome}\tsrc\texon\t{start}\t{}\t.\t+\t.\tgene_id \"{symbol}-id\"; gene_name \"{symbol}\";",
            start + 100
        )
    }

    fn write_gtf(dir: &Path, lines: &[String]) -> PathBuf {
        let path = dir.join("input.gtf");
        fs::write(&path, lines.join("\n") + "\n").unwrap();
        path
    }

    #[test]
    fn partitions_and_ranges() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let gtf = write_gtf(
            dir.path(),
            &[
                row("1", "ALPHA", 100),
                row("1", "ALPHA", 300),
                row("1", "BETA", 500),
                row("2", "GAMMA", 100),
            ],
        );

        let stats = build_symbol_index(&gtf, out.path()).unwrap();
        assert_eq!(stats.chromosomes, 2);
        assert_eq!(stats.symbols, 3);
        assert_eq!(stats.rows, 4);

        let chr1 = SymbolIndex::load(&index_path(out.path(), "1")).unwrap();
        assert_eq!(chr1.get("ALPHA"), Some(LineRange { start: 0, end: 2 }));
        assert_eq!(chr1.get("BETA"), Some(LineRange { start: 2, end: 3 }));
        assert!(chr1.get("GAMMA").is_none());

        let chr2 = SymbolIndex::load(&index_path(out.path(), "2")).unwrap();
        assert_eq!(chr2.get("GAMMA"), Some(LineRange { start: 0, end: 1 }));
    }

    #[test]
    fn every_symbol_round_trips_through_its_range() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let gtf = write_gtf(
            dir.path(),
            &[
                row("1", "ALPHA", 100),
                row("1", "BETA", 300),
                row("1", "BETA", 400),
                row("1", "DELTA", 600),
            ],
        );
        build_symbol_index(&gtf, out.path()).unwrap();

        let index = SymbolIndex::load(&index_path(out.path(), "1")).unwrap();
        let table = fs::read_to_string(partition_path(out.path(), "1")).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        for symbol in index.symbols() {
            let range = index.get(symbol).unwrap();
            assert!(range.start < range.end);
            for line in &lines[range.start..range.end] {
                assert_eq!(gene_symbol(line).unwrap(), symbol);
            }
        }
    }

    #[test]
    fn ungrouped_chromosome_is_structural_error() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let gtf = write_gtf(
            dir.path(),
            &[row("1", "ALPHA", 100), row("2", "BETA", 100), row("1", "GAMMA", 300)],
        );
        let err = build_symbol_index(&gtf, out.path()).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn comments_skipped_and_provenance_written() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let gtf = write_gtf(
            dir.path(),
            &["#!genome-build test".to_string(), row("1", "ALPHA", 100)],
        );
        let stats = build_symbol_index(&gtf, out.path()).unwrap();
        assert_eq!(stats.rows, 1);
        let infos = fs::read_to_string(out.path().join("build_infos.txt")).unwrap();
        assert!(infos.contains("source file:"));
    }

    #[test]
    fn missing_symbol_attribute_is_fatal() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let gtf = write_gtf(
            dir.path(),
            &["1\tsrc\texon\t1\t2\t.\t+\t.\tgene_id \"G1\";".to_string()],
        );
        let err = build_symbol_index(&gtf, out.path()).unwrap_err();
        assert!(matches!(err, Error::FieldExtraction(_)));
    }
}
