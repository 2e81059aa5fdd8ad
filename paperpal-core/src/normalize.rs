//! Per-entry field normalization for IEEEtran/sig-alternate style bibliographies.

use tracing::debug;

use crate::bibtex::BibEntry;
use crate::year::{extract_year, YearNotFoundError};

/// Normalize one entry in place:
/// - derive `year` from `date` (the `date` field stays),
/// - drop `url` unless the entry is `@online` or `@misc`,
/// - drop `doi`.
///
/// Applying it twice is the same as applying it once.
pub fn normalize_entry(entry: &mut BibEntry) -> Result<(), YearNotFoundError> {
    if let Some(date) = entry.get("date") {
        let year = extract_year(date)?;
        debug!(entry_key = %entry.entry_key, year, "Derived year from date");
        entry.set("year", year.to_string());
    }

    if !entry.is_web_reference() && entry.remove("url").is_some() {
        debug!(entry_key = %entry.entry_key, entry_type = %entry.entry_type, "Removed url");
    }

    if entry.remove("doi").is_some() {
        debug!(entry_key = %entry.entry_key, "Removed doi");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entry_type: &str, fields: &[(&str, &str)]) -> BibEntry {
        let mut entry = BibEntry::new(entry_type, "key");
        for (name, value) in fields {
            entry.set(name, *value);
        }
        entry
    }

    #[test]
    fn test_formal_venue_loses_url_and_doi() {
        let mut e = entry(
            "inproceedings",
            &[
                ("date", "2009"),
                ("doi", "10.1145/1555271.1555281"),
                ("url", "http://doi.acm.org/10.1145/1555271.1555281"),
                ("pages", "37--42"),
            ],
        );
        normalize_entry(&mut e).unwrap();

        assert_eq!(e.get("year"), Some("2009"));
        assert_eq!(e.get("date"), Some("2009"));
        assert_eq!(e.get("pages"), Some("37--42"));
        assert!(!e.contains("doi"));
        assert!(!e.contains("url"));
    }

    #[test]
    fn test_web_references_keep_url() {
        for entry_type in ["online", "misc", "Online", "MISC"] {
            let mut e = entry(entry_type, &[("url", "http://x"), ("doi", "10.1/x")]);
            normalize_entry(&mut e).unwrap();
            assert_eq!(e.get("url"), Some("http://x"), "{entry_type}");
            assert!(!e.contains("doi"), "{entry_type}");
        }
    }

    #[test]
    fn test_year_is_overwritten_from_date() {
        let mut e = entry("article", &[("year", "1900"), ("date", "April 2014")]);
        normalize_entry(&mut e).unwrap();
        assert_eq!(e.get("year"), Some("2014"));
    }

    #[test]
    fn test_no_date_leaves_year_alone() {
        let mut e = entry("article", &[("year", "1900")]);
        normalize_entry(&mut e).unwrap();
        assert_eq!(e.get("year"), Some("1900"));
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let mut e = entry("article", &[("date", "forthcoming")]);
        let err = normalize_entry(&mut e).unwrap_err();
        assert_eq!(err.text, "forthcoming");
    }

    #[test]
    fn test_idempotent() {
        let mut once = entry(
            "book",
            &[("date", "06/2012"), ("url", "u"), ("doi", "d"), ("title", "T")],
        );
        normalize_entry(&mut once).unwrap();
        let mut twice = once.clone();
        normalize_entry(&mut twice).unwrap();
        assert_eq!(once, twice);
    }
}
