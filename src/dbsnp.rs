//! dbSNP flat-file importer: variant dumps → normalized tabular files.
//!
//! Each input is a gzip-compressed ASN.1 flat dump for one chromosome:
//! blank-line-separated records of `|`-delimited tagged sub-lines. The
//! importer extracts a fixed field set per record, applies the default and
//! orientation normalization rules, drops invalid records, sorts the
//! survivors by genomic position, and writes one tab-separated table per
//! input file with a `//`-prefixed provenance header.
//!
//! Normalization rules:
//! - records whose chromosome differs from the file's label are discarded
//! - numeric fields default to 0.0 when unparsable (counted per file)
//! - `-`-oriented records have their alleles complemented; output is
//!   always `+`-oriented
//! - positions are 0-based

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::Error;
use crate::nucleotide::complement;
use crate::table::Table;

/// Output column order.
pub const LEGEND: [&str; 13] = [
    "pos",
    "chromosome",
    "rs",
    "type",
    "alleles",
    "validated",
    "assembly",
    "original_orientation",
    "maf_allele",
    "maf_count",
    "maf",
    "het",
    "se(het)",
];

/// One normalized variant record. Immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// 0-based position within the chromosome.
    pub position: i64,
    pub chromosome: String,
    pub rs: String,
    pub kind: String,
    pub alleles: String,
    pub validated: String,
    pub assembly: String,
    pub original_orientation: String,
    pub maf_allele: String,
    pub maf_count: f64,
    pub maf: f64,
    pub het: f64,
    pub se_het: f64,
}

impl VariantRecord {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.position.to_string(),
            self.chromosome.clone(),
            self.rs.clone(),
            self.kind.clone(),
            self.alleles.clone(),
            self.validated.clone(),
            self.assembly.clone(),
            self.original_orientation.clone(),
            self.maf_allele.clone(),
            self.maf_count.to_string(),
            self.maf.to_string(),
            self.het.to_string(),
            self.se_het.to_string(),
        ]
    }
}

/// Raw field values accumulated while scanning one record's sub-lines.
#[derive(Default)]
struct RawRecord {
    rs: Option<String>,
    kind: Option<String>,
    alleles: Option<String>,
    het: Option<String>,
    se_het: Option<String>,
    validated: Option<String>,
    assembly: Option<String>,
    chromosome: Option<String>,
    position: Option<i64>,
    original_orientation: Option<String>,
    maf_allele: Option<String>,
    maf_count: Option<String>,
    maf: Option<String>,
}

/// Strip a `tag=` prefix from a `|`-delimited field.
fn tag_value(field: &str, tag: &str) -> String {
    let trimmed = field.trim();
    trimmed.strip_prefix(tag).unwrap_or(trimmed).trim().to_string()
}

/// Fetch field `index` of a tagged sub-line, or fail the file.
///
/// A tagged line with too few fields is a structural mismatch: the record
/// separator can no longer be trusted, so the whole file is aborted.
fn field<'l>(fields: &[&'l str], index: usize, tag: &str) -> Result<&'l str, Error> {
    fields.get(index).copied().ok_or_else(|| {
        Error::FieldExtraction(format!(
            "{tag} line has {} fields, need at least {}",
            fields.len(),
            index + 1
        ))
    })
}

/// Coerce a numeric field, substituting 0.0 (and counting) on failure.
fn coerce_numeric(value: Option<&str>, substitutions: &mut usize) -> f64 {
    match value.and_then(|v| v.parse::<f64>().ok()) {
        Some(v) => v,
        None => {
            *substitutions += 1;
            0.0
        }
    }
}

/// Parse one `\n\n`-separated record.
///
/// Returns `Ok(None)` when the record is dropped (chromosome mismatch,
/// non-integer position, or a missing critical field); the substitution
/// counter is only advanced for records that survive to coercion.
fn parse_record(
    text: &str,
    expected_chromosome: &str,
    assembly_tag: &str,
) -> Result<(Option<VariantRecord>, usize), Error> {
    let mut raw = RawRecord::default();

    for line in text.lines() {
        let fields: Vec<&str> = line.split('|').collect();
        let first = fields[0].trim();

        if let Some(id) = first.strip_prefix("rs") {
            if raw.rs.is_none() {
                raw.rs = Some(id.trim().to_string());
                raw.kind = Some(field(&fields, 3, "rs")?.trim().to_string());
            }
        } else if first.starts_with("SNP") && raw.rs.is_some() {
            raw.alleles = Some(tag_value(field(&fields, 1, "SNP")?, "alleles=").replace('\'', ""));
            raw.het = Some(tag_value(field(&fields, 2, "SNP")?, "het="));
            raw.se_het = Some(tag_value(field(&fields, 3, "SNP")?, "se(het)="));
        } else if first.starts_with("VAL") && raw.rs.is_some() {
            raw.validated = Some(tag_value(field(&fields, 1, "VAL")?, "validated="));
        } else if first.starts_with("CTG")
            && raw.rs.is_some()
            && (raw.chromosome.is_none() || raw.position.is_none())
        {
            let assembly = field(&fields, 1, "CTG")?;
            if !assembly.contains(assembly_tag) {
                continue;
            }
            raw.original_orientation =
                Some(tag_value(fields[fields.len() - 1], "orient="));
            raw.assembly = Some(tag_value(assembly, "assembly="));
            let chromosome = tag_value(field(&fields, 2, "CTG")?, "chr=");
            let position = tag_value(field(&fields, 3, "CTG")?, "chr-pos=");

            let Ok(position) = position.parse::<i64>() else {
                return Ok((None, 0));
            };
            if chromosome != expected_chromosome {
                return Ok((None, 0));
            }
            raw.chromosome = Some(chromosome);
            raw.position = Some(position - 1);
        } else if first.starts_with("GMAF") && raw.rs.is_some() {
            raw.maf_allele = Some(tag_value(field(&fields, 1, "GMAF")?, "allele="));
            raw.maf_count = Some(tag_value(field(&fields, 2, "GMAF")?, "count="));
            raw.maf = Some(tag_value(field(&fields, 3, "GMAF")?, "MAF="));
        }
    }

    // Critical fields: without all of them the record is dropped entirely.
    let (Some(rs), Some(chromosome), Some(position), Some(alleles), Some(assembly), Some(validated)) = (
        raw.rs,
        raw.chromosome,
        raw.position,
        raw.alleles,
        raw.assembly,
        raw.validated,
    ) else {
        return Ok((None, 0));
    };

    let mut substitutions = 0;
    let maf_count = coerce_numeric(raw.maf_count.as_deref(), &mut substitutions);
    let maf = coerce_numeric(raw.maf.as_deref(), &mut substitutions);
    let het = coerce_numeric(raw.het.as_deref(), &mut substitutions);
    let se_het = coerce_numeric(raw.se_het.as_deref(), &mut substitutions);

    let original_orientation = raw.original_orientation.unwrap_or_default();
    // Normalize to + orientation; the original orientation is kept as
    // provenance and the complement is never re-applied downstream.
    let alleles = if original_orientation == "-" {
        complement(&alleles)
    } else {
        alleles
    };

    Ok((
        Some(VariantRecord {
            position,
            chromosome,
            rs,
            kind: raw.kind.unwrap_or_default(),
            alleles,
            validated,
            assembly,
            original_orientation,
            maf_allele: raw.maf_allele.unwrap_or_default(),
            maf_count,
            maf,
            het,
            se_het,
        }),
        substitutions,
    ))
}

/// Extract the chromosome label from a `*ch<label>.flat.gz` file name.
fn chromosome_label(path: &Path) -> Result<String, Error> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Parse(format!("unreadable file name: {}", path.display())))?;
    let stem = name
        .strip_suffix(".flat.gz")
        .ok_or_else(|| Error::Parse(format!("not a .flat.gz file name: {name}")))?;
    let pos = stem
        .rfind("ch")
        .ok_or_else(|| Error::Parse(format!("no chromosome label in file name: {name}")))?;
    let label = &stem[pos + 2..];
    if label.is_empty() {
        return Err(Error::Parse(format!("empty chromosome label in: {name}")));
    }
    Ok(label.to_string())
}

/// Result of importing one flat file.
#[derive(Debug)]
pub struct FileImportResult {
    pub chromosome: String,
    pub records: usize,
    pub substitutions: usize,
    pub out_path: PathBuf,
}

/// Import one `*.flat.gz` dump into a normalized table under `out_dir`.
pub fn import_flat_file(
    path: &Path,
    out_dir: &Path,
    assembly_tag: &str,
) -> Result<FileImportResult, Error> {
    let label = chromosome_label(path)?;

    let mut content = String::new();
    GzDecoder::new(File::open(path)?).read_to_string(&mut content)?;

    let mut blocks = content.split("\n\n");
    let file_header = blocks.next().unwrap_or_default();

    // Keyed by position: sorted output, later records replace earlier ones
    // at the same position.
    let mut records: BTreeMap<i64, VariantRecord> = BTreeMap::new();
    let mut substitutions = 0usize;

    for block in blocks {
        if block.trim().is_empty() {
            continue;
        }
        let (record, subs) = parse_record(block, &label, assembly_tag)?;
        substitutions += subs;
        if let Some(record) = record {
            records.insert(record.position, record);
        }
    }

    let mut table = Table::new(&LEGEND);
    table.set_header(&format!(
        "source file: {}\n{}\nnumeric fields with non-numeric values: {} (substituted with the default 0.0)",
        path.display(),
        file_header,
        substitutions
    ));
    for record in records.values() {
        table.push_row(record.to_row())?;
    }

    fs::create_dir_all(out_dir)?;
    let out_path = out_dir.join(format!("chr{label}.dbsnp.tsv"));
    table.save(&out_path)?;

    Ok(FileImportResult {
        chromosome: label,
        records: records.len(),
        substitutions,
        out_path,
    })
}

/// Outcome of a package import: per-file results plus per-file failures.
#[derive(Debug)]
pub struct PackageImport {
    pub results: Vec<FileImportResult>,
    pub failures: Vec<(PathBuf, Error)>,
}

/// Import every `*.flat.gz` file in `package_dir`.
///
/// A failing file aborts only itself; remaining files are still imported.
/// The fixed format-description file is written once per output directory.
pub fn import_package(
    package_dir: &Path,
    out_dir: &Path,
    assembly_tag: &str,
) -> Result<PackageImport, Error> {
    let mut flat_files: Vec<PathBuf> = fs::read_dir(package_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".flat.gz"))
        })
        .collect();
    flat_files.sort();

    fs::create_dir_all(out_dir)?;

    let mut import = PackageImport {
        results: Vec::new(),
        failures: Vec::new(),
    };
    for path in flat_files {
        match import_flat_file(&path, out_dir, assembly_tag) {
            Ok(result) => import.results.push(result),
            Err(err) => import.failures.push((path, err)),
        }
    }

    write_format_description(out_dir)?;
    Ok(import)
}

/// Human-readable description of the normalization rules, written once per
/// output directory.
fn write_format_description(out_dir: &Path) -> Result<(), Error> {
    let text = "\
Normalized dbSNP variant tables differ from the raw flat files:
- records whose chromosome differs from the file's chromosome were discarded
- numeric values (het, se(het), MAF, MAF count) default to 0.0 when not parsable as a number
- all records are normalized to + orientation; the alleles of - oriented records were replaced by their complements
- positions are 0-based
- extracted fields: pos, chromosome, rs, type, alleles, validated, assembly, original_orientation, maf_allele, maf_count, maf, het, se(het)
";
    let mut f = File::create(out_dir.join("README_format-description.txt"))?;
    f.write_all(text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;

    fn record(rs: &str, chromosome: &str, pos: &str, orient: &str, het: &str) -> String {
        format!(
            "rs{rs} | human | 9606 | snp | genotype=NO\n\
             SNP | alleles='A/G' | het={het} | se(het)=0.0354\n\
             VAL | validated=YES | min_success_rate=99 | notwithdrawn\n\
             CTG | assembly=GRCh38.p2 | chr={chromosome} | chr-pos={pos} | NT_0555.29 | ctg-start=52043 | orient={orient}\n\
             GMAF | allele=G | count=552 | MAF=0.1103"
        )
    }

    fn write_flat_gz(dir: &Path, name: &str, records: &[String]) -> PathBuf {
        let content = format!("dbSNP flat file header\n\n{}\n", records.join("\n\n"));
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::fast());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    #[test]
    fn parse_plus_oriented_record() {
        let text = record("242", "5", "100043", "+", "0.5");
        let (parsed, subs) = parse_record(&text, "5", "GRCh").unwrap();
        let record = parsed.unwrap();
        assert_eq!(record.rs, "242");
        assert_eq!(record.kind, "snp");
        // 1-based 100043 becomes 0-based 100042
        assert_eq!(record.position, 100_042);
        assert_eq!(record.alleles, "A/G");
        assert_eq!(record.validated, "YES");
        assert_eq!(record.assembly, "GRCh38.p2");
        assert_eq!(record.maf_allele, "G");
        assert_eq!(record.maf_count, 552.0);
        assert_eq!(record.het, 0.5);
        assert_eq!(subs, 0);
    }

    #[test]
    fn minus_orientation_complements_alleles() {
        let text = record("7", "5", "500", "-", "0.5");
        let (parsed, _) = parse_record(&text, "5", "GRCh").unwrap();
        let record = parsed.unwrap();
        assert_eq!(record.alleles, "T/C");
        assert_eq!(record.original_orientation, "-");
    }

    #[test]
    fn chromosome_mismatch_drops_record_without_substitutions() {
        // het is unparsable, but the record is rejected before coercion
        let text = record("9", "3", "500", "+", "?");
        let (parsed, subs) = parse_record(&text, "5", "GRCh").unwrap();
        assert!(parsed.is_none());
        assert_eq!(subs, 0);
    }

    #[test]
    fn non_integer_position_drops_record() {
        let text = record("9", "5", "?", "+", "0.5");
        let (parsed, subs) = parse_record(&text, "5", "GRCh").unwrap();
        assert!(parsed.is_none());
        assert_eq!(subs, 0);
    }

    #[test]
    fn missing_critical_field_drops_record() {
        // No VAL line, so `validated` never resolves
        let text = "rs11 | human | 9606 | snp\n\
                    SNP | alleles='A/G' | het=0.5 | se(het)=0.03\n\
                    CTG | assembly=GRCh38.p2 | chr=5 | chr-pos=100 | orient=+";
        let (parsed, _) = parse_record(text, "5", "GRCh").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn unparsable_numerics_substituted_and_counted() {
        let text = record("13", "5", "100", "+", "?");
        let (parsed, subs) = parse_record(&text, "5", "GRCh").unwrap();
        assert_eq!(parsed.unwrap().het, 0.0);
        assert_eq!(subs, 1);
    }

    #[test]
    fn ctg_without_assembly_tag_ignored() {
        let text = "rs5 | human | 9606 | snp\n\
                    SNP | alleles='C/T' | het=0.1 | se(het)=0.01\n\
                    VAL | validated=YES\n\
                    CTG | assembly=Celera | chr=5 | chr-pos=77 | orient=+\n\
                    CTG | assembly=GRCh38.p2 | chr=5 | chr-pos=99 | orient=+";
        let (parsed, _) = parse_record(text, "5", "GRCh").unwrap();
        assert_eq!(parsed.unwrap().position, 98);
    }

    #[test]
    fn malformed_tag_line_aborts_file() {
        let text = "rs5 | human | 9606 | snp\nSNP | alleles='C/T'";
        let err = parse_record(text, "5", "GRCh").unwrap_err();
        assert!(matches!(err, Error::FieldExtraction(_)));
    }

    #[test]
    fn label_from_file_name() {
        assert_eq!(
            chromosome_label(Path::new("/pkg/ds_flat_ch5.flat.gz")).unwrap(),
            "5"
        );
        assert_eq!(
            chromosome_label(Path::new("ds_flat_chMT.flat.gz")).unwrap(),
            "MT"
        );
        assert!(chromosome_label(Path::new("snps.txt")).is_err());
    }

    #[test]
    fn file_output_sorted_and_annotated() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let path = write_flat_gz(
            dir.path(),
            "ds_flat_ch5.flat.gz",
            &[
                record("2", "5", "900", "+", "0.5"),
                record("1", "5", "100", "+", "?"),
            ],
        );

        let result = import_flat_file(&path, out.path(), "GRCh").unwrap();
        assert_eq!(result.chromosome, "5");
        assert_eq!(result.records, 2);
        assert_eq!(result.substitutions, 1);

        let text = fs::read_to_string(&result.out_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("//source file:"));
        assert!(text.contains("//dbSNP flat file header"));
        assert!(text.contains("non-numeric values: 1"));

        let data: Vec<&str> = lines.iter().filter(|l| !l.starts_with("//")).copied().collect();
        assert_eq!(data.len(), 2);
        // Sorted by position ascending, positions 0-based and non-negative
        assert!(data[0].starts_with("99\t"));
        assert!(data[1].starts_with("899\t"));
    }

    #[test]
    fn mismatched_pair_yields_empty_table() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        // File is for chromosome 5; both records report chromosome 3
        let path = write_flat_gz(
            dir.path(),
            "ds_flat_ch5.flat.gz",
            &[
                record("1", "3", "100", "+", "?"),
                record("2", "3", "200", "+", "?"),
            ],
        );

        let result = import_flat_file(&path, out.path(), "GRCh").unwrap();
        assert_eq!(result.records, 0);
        assert_eq!(result.substitutions, 0);
        let text = fs::read_to_string(&result.out_path).unwrap();
        assert!(text.lines().all(|l| l.starts_with("//")));
    }

    #[test]
    fn same_position_keeps_latest_record() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let path = write_flat_gz(
            dir.path(),
            "ds_flat_ch5.flat.gz",
            &[
                record("1", "5", "100", "+", "0.5"),
                record("2", "5", "100", "+", "0.5"),
            ],
        );
        let result = import_flat_file(&path, out.path(), "GRCh").unwrap();
        assert_eq!(result.records, 1);
        let text = fs::read_to_string(&result.out_path).unwrap();
        assert!(text.contains("\t2\t"));
        assert!(!text.contains("\t1\t"));
    }

    #[test]
    fn package_import_continues_past_bad_file() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_flat_gz(
            dir.path(),
            "ds_flat_ch1.flat.gz",
            &[record("1", "1", "100", "+", "0.5")],
        );
        // Not gzip data: this file fails, the other still imports
        fs::write(dir.path().join("ds_flat_ch2.flat.gz"), "not gzip").unwrap();

        let import = import_package(dir.path(), out.path(), "GRCh").unwrap();
        assert_eq!(import.results.len(), 1);
        assert_eq!(import.failures.len(), 1);
        assert!(out.path().join("chr1.dbsnp.tsv").exists());
        assert!(out.path().join("README_format-description.txt").exists());
    }
}
