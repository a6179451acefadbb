//! Minimal tab-separated table writer with comment-prefixed headers.
//!
//! Output shape: free-form provenance header lines and the legend row are
//! prefixed with `//`; data rows follow, one per line, tab-joined. This is
//! the on-disk format of the normalized variant tables.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Error;

pub struct Table {
    columns: Vec<String>,
    header: Option<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            header: None,
            rows: Vec::new(),
        }
    }

    /// Set the free-form provenance header (may span multiple lines).
    pub fn set_header(&mut self, header: &str) {
        self.header = Some(header.to_string());
    }

    /// Append a data row; its arity must match the legend.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), Error> {
        if row.len() != self.columns.len() {
            return Err(Error::FieldExtraction(format!(
                "table row has {} fields, legend has {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if let Some(ref header) = self.header {
            for line in header.lines() {
                writeln!(writer, "//{line}")?;
            }
        }
        writeln!(writer, "//{}", self.columns.join("\t"))?;
        for row in &self.rows {
            writeln!(writer, "{}", row.join("\t"))?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
