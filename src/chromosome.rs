//! Chromosome entity: identity, header, and sequence offsets.

use crate::error::Error;

/// A chromosome in the imported dataset.
///
/// Created when the annotation importer first sees a row for a label known
/// to the sequence importer; the header and offsets come from the sequence
/// pass and are immutable afterwards. `genes` is assigned by the relation
/// resolver and holds registry indices in first-seen order.
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub label: String,
    pub header: String,
    pub sequence_start: u64,
    pub sequence_end: u64,
    pub genes: Vec<usize>,
}

impl Chromosome {
    pub fn validate(&self) -> Result<(), Error> {
        if self.label.is_empty() {
            return Err(Error::Parse("chromosome has an empty label".to_string()));
        }
        if self.sequence_end < self.sequence_start {
            return Err(Error::Parse(format!(
                "chromosome {}: sequence end {} precedes start {}",
                self.label, self.sequence_end, self.sequence_start
            )));
        }
        Ok(())
    }

    /// Length of the flattened sequence blob.
    #[must_use]
    pub fn sequence_len(&self) -> u64 {
        self.sequence_end - self.sequence_start
    }
}
