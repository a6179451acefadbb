//! Strand orientation for genomic features.

use std::fmt;

use crate::error::Error;

/// Strand orientation of a genomic feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Strand {
    Forward = 0,
    Reverse = 1,
}

impl Strand {
    /// Parse from GTF column 7. "-" is reverse; everything else is forward.
    #[must_use]
    pub fn from_gtf(s: &str) -> Self {
        if s == "-" { Self::Reverse } else { Self::Forward }
    }

    #[must_use]
    pub fn is_reverse(self) -> bool {
        self == Self::Reverse
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
        }
    }
}

impl std::str::FromStr for Strand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Forward),
            "-" => Ok(Self::Reverse),
            _ => Err(Error::Parse(format!("invalid strand: '{s}'"))),
        }
    }
}
