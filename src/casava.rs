//! Casava SNP importer: `snps.txt` → per-chromosome normalized files.
//!
//! Produces a light dataset carrying only SNP information: comment lines
//! are dropped, doubled tabs collapsed, the chromosome column and the
//! range-end column removed (records keep a single position), and the
//! remaining fields joined with `;`. Rows are grouped by the leading
//! chromosome column; each group is flushed to its own file before the
//! next begins.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::Error;

#[derive(Debug, Default, Clone, Copy)]
pub struct CasavaImportStats {
    pub chromosomes: usize,
    pub rows: usize,
}

/// Import a Casava `snps.txt` dump into `out_dir`.
pub fn import_casava_snps(snps_path: &Path, out_dir: &Path) -> Result<CasavaImportStats, Error> {
    let file = File::open(snps_path)?;
    let reader = BufReader::new(file);

    fs::create_dir_all(out_dir)?;

    let mut stats = CasavaImportStats::default();
    let mut flushed: HashSet<String> = HashSet::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let collapsed = line.replace("\t\t", "\t");
        let fields: Vec<&str> = collapsed.split('\t').map(str::trim).collect();
        if fields.len() < 3 {
            return Err(Error::FieldExtraction(format!(
                "casava row has {} fields, need at least 3",
                fields.len()
            )));
        }

        let label = fields[0].to_string();
        let boundary = current.as_ref().is_none_or(|(l, _)| *l != label);
        if boundary {
            if let Some((done_label, rows)) = current.take() {
                flush_chromosome(out_dir, &done_label, &rows, &mut stats)?;
                flushed.insert(done_label);
            }
            if flushed.contains(&label) {
                return Err(Error::Structural(format!(
                    "chromosome {label} reappears after its file was flushed; \
                     input rows must be grouped by chromosome"
                )));
            }
            current = Some((label.clone(), Vec::new()));
        }

        // Drop the chromosome column and the range end, keeping the range
        // start as the record's single position.
        let mut kept: Vec<&str> = Vec::with_capacity(fields.len() - 2);
        kept.push(fields[1]);
        kept.extend(&fields[3..]);
        current
            .as_mut()
            .expect("group opened above")
            .1
            .push(kept.join(";"));
    }

    if let Some((label, rows)) = current.take() {
        flush_chromosome(out_dir, &label, &rows, &mut stats)?;
    }

    let mut provenance = File::create(out_dir.join("sourceFile.txt"))?;
    writeln!(provenance, "{}", snps_path.display())?;

    Ok(stats)
}

fn flush_chromosome(
    out_dir: &Path,
    label: &str,
    rows: &[String],
    stats: &mut CasavaImportStats,
) -> Result<(), Error> {
    let mut file = File::create(out_dir.join(format!("{label}.casavasnps")))?;
    for row in rows {
        writeln!(file, "{row}")?;
    }
    file.flush()?;
    stats.chromosomes += 1;
    stats.rows += rows.len();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn import(content: &str) -> (TempDir, Result<CasavaImportStats, Error>) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("snps.txt");
        fs::write(&input, content).unwrap();
        let out = TempDir::new().unwrap();
        let result = import_casava_snps(&input, out.path());
        (out, result)
    }

    #[test]
    fn rows_normalized_per_chromosome() {
        let content = "\
# header comment
chr1\t100\t101\tA\tG\t30
chr1\t250\t251\tC\tT\t12
chr2\t77\t78\tG\tA\t9
";
        let (out, result) = import(content);
        let stats = result.unwrap();
        assert_eq!(stats.chromosomes, 2);
        assert_eq!(stats.rows, 3);

        let chr1 = fs::read_to_string(out.path().join("chr1.casavasnps")).unwrap();
        assert_eq!(chr1, "100;A;G;30\n250;C;T;12\n");
        let chr2 = fs::read_to_string(out.path().join("chr2.casavasnps")).unwrap();
        assert_eq!(chr2, "77;G;A;9\n");
    }

    #[test]
    fn doubled_tabs_collapsed() {
        let content = "chr1\t100\t101\t\tA\tG\n";
        let (out, result) = import(content);
        result.unwrap();
        let chr1 = fs::read_to_string(out.path().join("chr1.casavasnps")).unwrap();
        assert_eq!(chr1, "100;A;G\n");
    }

    #[test]
    fn provenance_written() {
        let (out, result) = import("chr1\t100\t101\tA\n");
        result.unwrap();
        let provenance = fs::read_to_string(out.path().join("sourceFile.txt")).unwrap();
        assert!(provenance.contains("snps.txt"));
    }

    #[test]
    fn ungrouped_input_rejected() {
        let content = "chr1\t100\t101\tA\nchr2\t50\t51\tC\nchr1\t200\t201\tG\n";
        let (_out, result) = import(content);
        assert!(matches!(result, Err(Error::Structural(_))));
    }

    #[test]
    fn short_row_rejected() {
        let (_out, result) = import("chr1\t100\n");
        assert!(matches!(result, Err(Error::FieldExtraction(_))));
    }
}
