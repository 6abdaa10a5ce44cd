//! The trigger-event table.
//!
//! Tab-separated two-column records: a structure identifier and a
//! trigger-event specifier. A specifier is a single code, a comma-separated
//! list, or an inclusive range `LOW-HIGH` over codes sharing an alphabetic
//! prefix with a numeric suffix compared numerically.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Result, SchemaError};

/// Read-only mapping from structure identifier to its trigger-event set.
/// Constructed once per process run and shared across all conversions.
#[derive(Debug, Clone)]
pub struct TriggerTable {
    entries: Vec<TriggerEntry>,
}

#[derive(Debug, Clone)]
struct TriggerEntry {
    structure_id: String,
    triggers: BTreeSet<String>,
}

impl TriggerTable {
    /// Load the table from a tab-separated file with a header row.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| SchemaError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Load the table from any tab-separated source with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let mut entries = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let structure_id = record.get(0).unwrap_or("").trim();
            let specifier = record.get(1).unwrap_or("").trim();
            if structure_id.is_empty() || specifier.is_empty() {
                continue;
            }
            entries.push(TriggerEntry {
                structure_id: structure_id.to_string(),
                triggers: expand_specifier(specifier)?,
            });
        }
        debug!(entries = entries.len(), "loaded trigger table");
        Ok(TriggerTable { entries })
    }

    /// Build a table directly from (structure id, specifier) pairs.
    pub fn from_entries<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut entries = Vec::new();
        for (structure_id, specifier) in pairs {
            entries.push(TriggerEntry {
                structure_id: structure_id.to_string(),
                triggers: expand_specifier(specifier)?,
            });
        }
        Ok(TriggerTable { entries })
    }

    /// Resolve the unique structure identifier for a message type and
    /// trigger event. Zero matches and multiple matches are both hard
    /// errors; ambiguity is never resolved by a silent pick.
    pub fn resolve(&self, message_type: &str, trigger: &str) -> Result<&str> {
        let matches: Vec<&TriggerEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.structure_id.get(..3) == Some(message_type)
                    && entry.triggers.contains(trigger)
            })
            .collect();
        match matches.as_slice() {
            [entry] => Ok(&entry.structure_id),
            _ => Err(SchemaError::UnknownStructure {
                message_type: message_type.to_string(),
                trigger: trigger.to_string(),
                matches: matches.len(),
            }),
        }
    }
}

/// Expand a trigger-event specifier into the exact set of codes it names.
pub fn expand_specifier(specifier: &str) -> Result<BTreeSet<String>> {
    let mut codes = BTreeSet::new();
    for piece in specifier.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            return Err(invalid(specifier, "empty code in list"));
        }
        match piece.split_once('-') {
            Some((low, high)) => expand_range(specifier, low.trim(), high.trim(), &mut codes)?,
            None => {
                codes.insert(piece.to_string());
            }
        }
    }
    Ok(codes)
}

/// Expand `LOW-HIGH`. Codes are ordered strings; the range is enumerable
/// only when both ends share an alphabetic prefix and end in a purely
/// numeric suffix, which is compared numerically and zero-padded to the low
/// end's width.
fn expand_range(
    specifier: &str,
    low: &str,
    high: &str,
    codes: &mut BTreeSet<String>,
) -> Result<()> {
    let (low_prefix, low_digits) = split_numeric_suffix(low);
    let (high_prefix, high_digits) = split_numeric_suffix(high);
    if low_digits.is_empty() || high_digits.is_empty() {
        return Err(invalid(specifier, "range ends lack a numeric suffix"));
    }
    if low_prefix != high_prefix {
        return Err(invalid(specifier, "range ends have different prefixes"));
    }
    let start: u32 = low_digits
        .parse()
        .map_err(|_| invalid(specifier, "numeric suffix out of range"))?;
    let end: u32 = high_digits
        .parse()
        .map_err(|_| invalid(specifier, "numeric suffix out of range"))?;
    if start > end {
        return Err(invalid(specifier, "range low end sorts after high end"));
    }
    let width = low_digits.len();
    for value in start..=end {
        codes.insert(format!("{low_prefix}{value:0width$}"));
    }
    Ok(())
}

/// Split off the maximal trailing run of ASCII digits.
fn split_numeric_suffix(code: &str) -> (&str, &str) {
    let split = code
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |idx| idx + 1);
    code.split_at(split)
}

fn invalid(specifier: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidSpecifier {
        specifier: specifier.to_string(),
        reason: reason.to_string(),
    }
}
