//! Error types for the Genopack library.

use thiserror::Error;

/// Errors that can occur during an import run.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input has the wrong count or shape of expected files, or
    /// violates a structural assumption such as chromosome grouping.
    #[error("{0}")]
    Structural(String),

    /// A feature row references an entity that should already exist but
    /// does not. Fatal for the run: continuing would corrupt the graph.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// A required column or tag is absent from a row or record.
    /// Fatal for annotation rows; record-scoped for variant records.
    #[error("{0}")]
    FieldExtraction(String),

    /// A value could not be parsed.
    #[error("{0}")]
    Parse(String),
}
