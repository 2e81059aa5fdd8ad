//! Bibliography fixer: parse, normalize every entry, serialize as ASCII.

use tracing::{error, info};

use crate::bibtex::{self, ParseError};
use crate::normalize::normalize_entry;
use crate::year::YearNotFoundError;

#[derive(Debug, thiserror::Error)]
pub enum FixError {
    #[error("malformed bibliography: {0}")]
    Parse(#[from] ParseError),
    #[error("entry {entry_key}: {source}")]
    Year {
        entry_key: String,
        #[source]
        source: YearNotFoundError,
    },
}

/// Fix a whole bibliography for use with IEEEtran.cls and sig-alternate.cls:
/// ASCII-only output, years derived from dates, no DOIs, and URLs only on
/// `@online`/`@misc` entries. Entry order is preserved.
pub fn fix_bibliography(text: &str) -> Result<String, FixError> {
    let mut bibliography = bibtex::parse(text).map_err(|e| {
        error!(error = %e, "Failed to parse bibliography");
        e
    })?;

    let mut fixed = 0usize;
    for entry in bibliography.entries_mut() {
        normalize_entry(entry).map_err(|source| {
            error!(entry_key = %entry.entry_key, error = %source, "Failed to normalize entry");
            FixError::Year {
                entry_key: entry.entry_key.clone(),
                source,
            }
        })?;
        fixed += 1;
    }

    info!(entries = fixed, "Fixed bibliography");
    Ok(bibtex::format_bibliography(&bibliography))
}
