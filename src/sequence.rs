//! Sequence importer: per-chromosome files → flattened sequence blobs.
//!
//! Reads one `chr<label>.fa` file per chromosome from a package directory,
//! strips line breaks, uppercases the bases, and writes one blob per
//! chromosome to the target directory. Records each chromosome's header
//! line and its start/end offset within the concatenated sequence space;
//! the offsets are bookkeeping for later lookup, not used for any linking
//! here.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Per-chromosome metadata produced by the sequence pass.
#[derive(Debug, Clone)]
pub struct ChromosomeInfo {
    pub label: String,
    pub header: String,
    /// Offset of the first base within the concatenated sequence space.
    pub start: u64,
    /// Offset one past the last base.
    pub end: u64,
}

/// All chromosome metadata from one sequence import, in processing order.
#[derive(Debug)]
pub struct SequenceSet {
    infos: Vec<ChromosomeInfo>,
    by_label: HashMap<String, usize>,
}

impl SequenceSet {
    /// Assemble a set from already-known metadata, e.g. when the blobs
    /// were produced by an earlier run.
    #[must_use]
    pub fn from_infos(infos: Vec<ChromosomeInfo>) -> Self {
        let by_label = infos
            .iter()
            .enumerate()
            .map(|(i, info)| (info.label.clone(), i))
            .collect();
        Self { infos, by_label }
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&ChromosomeInfo> {
        self.by_label.get(label).map(|&i| &self.infos[i])
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChromosomeInfo> {
        self.infos.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// Import all `chr<label>.fa` files from `package_dir` into `out_dir`.
///
/// Files are processed in sorted filename order so offsets are
/// deterministic. Fails with a structural error, writing nothing, if no
/// matching file exists. Creates `out_dir` if absent and writes a
/// `build_infos.txt` provenance file recording the source directory and
/// all headers.
pub fn import_sequences(package_dir: &Path, out_dir: &Path) -> Result<SequenceSet, Error> {
    let mut chr_files = find_chromosome_files(package_dir)?;
    if chr_files.is_empty() {
        return Err(Error::Structural(format!(
            "no chr*.fa sequence files found in {}",
            package_dir.display()
        )));
    }
    chr_files.sort();

    fs::create_dir_all(out_dir)?;

    let mut infos = Vec::with_capacity(chr_files.len());
    let mut by_label = HashMap::with_capacity(chr_files.len());
    let mut headers = String::new();
    let mut offset: u64 = 0;

    for path in &chr_files {
        let label = chromosome_label(path)?;
        let (header, sequence) = read_sequence_file(path)?;
        headers.push_str(&header);
        headers.push('\n');

        let blob_path = out_dir.join(format!("chr{label}.dat"));
        fs::write(&blob_path, &sequence)?;

        let start = offset;
        let end = start + sequence.len() as u64;
        offset = end;

        by_label.insert(label.clone(), infos.len());
        infos.push(ChromosomeInfo {
            label,
            header,
            start,
            end,
        });
    }

    write_build_infos(out_dir, package_dir, &headers)?;

    Ok(SequenceSet { infos, by_label })
}

/// List the package files matching the `chr<label>.fa` naming convention.
fn find_chromosome_files(package_dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in fs::read_dir(package_dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("chr") && name.ends_with(".fa") && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Extract the chromosome label embedded in a `chr<label>.fa` filename.
fn chromosome_label(path: &Path) -> Result<String, Error> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Parse(format!("unreadable file name: {}", path.display())))?;
    let label = name
        .strip_prefix("chr")
        .and_then(|n| n.strip_suffix(".fa"))
        .ok_or_else(|| Error::Parse(format!("not a chr*.fa file name: {name}")))?;
    if label.is_empty() {
        return Err(Error::Parse(format!("empty chromosome label in: {name}")));
    }
    Ok(label.to_string())
}

/// Read one sequence file: header line, then bases.
///
/// Bases are uppercased and all intervening whitespace is dropped, so the
/// returned blob is a single flat line.
fn read_sequence_file(path: &Path) -> Result<(String, Vec<u8>), Error> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut header = String::new();
    reader.read_line(&mut header)?;
    let header = header.trim_end().to_string();
    if header.is_empty() {
        return Err(Error::FieldExtraction(format!(
            "sequence file has no header line: {}",
            path.display()
        )));
    }

    let mut sequence = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let start = sequence.len();
        sequence.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
        sequence[start..].make_ascii_uppercase();
    }
    Ok((header, sequence))
}

fn write_build_infos(out_dir: &Path, package_dir: &Path, headers: &str) -> Result<(), Error> {
    let mut f = File::create(out_dir.join("build_infos.txt"))?;
    writeln!(f, "source package directory: {}", package_dir.display())?;
    writeln!(f, "headers:\n------")?;
    f.write_all(headers.as_bytes())?;
    Ok(())
}
