//! GTF line and attribute parser.

use std::collections::HashMap;

use crate::error::Error;
use crate::strand::Strand;

use super::row::{Feature, GtfRow};

/// Parse a single GTF line.
///
/// Returns `None` for comment and blank lines. Data lines must carry the
/// nine tab-delimited GTF columns:
/// chromosome, source, feature, start, end, score, strand, frame, attributes.
pub fn parse_line(line: &str) -> Result<Option<GtfRow>, Error> {
    if line.starts_with('#') {
        return Ok(None);
    }
    let trimmed = line.trim_end();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let columns: Vec<&str> = trimmed.split('\t').collect();
    if columns.len() != 9 {
        return Err(Error::FieldExtraction(format!(
            "GTF line has {} columns, expected 9",
            columns.len()
        )));
    }

    let start: i64 = columns[3]
        .parse()
        .map_err(|e| Error::Parse(format!("invalid start '{}': {e}", columns[3])))?;
    let end: i64 = columns[4]
        .parse()
        .map_err(|e| Error::Parse(format!("invalid end '{}': {e}", columns[4])))?;
    let strand = Strand::from_gtf(columns[6]);
    let attributes = parse_attributes(columns[8]);

    Ok(Some(GtfRow::new(
        columns[0].to_string(),
        columns[1].to_string(),
        Feature::from_gtf(columns[2]),
        start,
        end,
        strand,
        attributes,
    )))
}

/// Parse GTF column 9 attributes into a key → value map.
///
/// Attributes are `key "value";` pairs. Parsing is by key name, tolerant of
/// ordering and unknown keys, so an upstream reordering of the attribute
/// sub-fields does not break extraction. Values keep their content with
/// surrounding quotes stripped.
#[must_use]
pub fn parse_attributes(attrs_str: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for pair in attrs_str.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some((key, value)) = pair.split_once(char::is_whitespace) else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        attrs.insert(key.to_string(), value.to_string());
    }
    attrs
}

/// Extract the gene symbol from a raw GTF line without a full row parse.
///
/// Schema assumption: the symbol is the `gene_name` attribute of column 9.
/// Used by the symbol-index builder, which otherwise treats rows as opaque
/// text.
pub fn gene_symbol(line: &str) -> Result<String, Error> {
    let attrs_column = line
        .split('\t')
        .nth(8)
        .ok_or_else(|| Error::FieldExtraction("GTF line has no attribute column".to_string()))?;
    let attrs = parse_attributes(attrs_column);
    attrs.get("gene_name").cloned().ok_or_else(|| {
        Error::FieldExtraction("GTF line has no gene_name attribute".to_string())
    })
}
