//! GTF annotation table reader: row-indexed access to parsed rows.

pub mod parser;
pub mod row;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;

pub use row::{Feature, GtfRow};

/// A fully parsed annotation table, rows in file order.
#[derive(Debug)]
pub struct GtfTable {
    rows: Vec<GtfRow>,
}

impl GtfTable {
    /// Parse a GTF file from disk.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse GTF from a buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut rows = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let parsed = parser::parse_line(&line)
                .map_err(|e| Error::Parse(format!("{e} (line {}: {line})", line_num + 1)))?;
            if let Some(row) = parsed {
                rows.push(row);
            }
        }
        Ok(Self { rows })
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&GtfRow> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GtfRow> {
        self.rows.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
