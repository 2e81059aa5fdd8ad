//! Author name formatting for PDF metadata.

use crate::contract::Author;

/// `"M. Night Shamylaan"`; absent or empty parts are skipped.
pub fn format_author(author: &Author) -> String {
    [author.first.as_deref(), author.last.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Two authors are joined with `" and "`; every other count uses `", "`
/// throughout, without a final conjunction.
pub fn format_authors(authors: &[Author]) -> String {
    if let [first, second] = authors {
        return format!("{} and {}", format_author(first), format_author(second));
    }
    authors
        .iter()
        .map(format_author)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(first: &str, last: &str) -> Author {
        Author {
            first: Some(first.to_string()),
            last: Some(last.to_string()),
        }
    }

    #[test]
    fn test_format_author() {
        let only_first = Author {
            first: Some("Devender".into()),
            last: None,
        };
        assert_eq!(format_author(&only_first), "Devender");
        assert_eq!(format_author(&author("M. Night", "Shamylaan")), "M. Night Shamylaan");
        assert_eq!(format_author(&Author::default()), "");
    }

    #[test]
    fn test_format_authors() {
        let a = author("S.", "Miyamoto");
        let b = author("K.", "Kondo");
        let c = author("H.", "Tanaka");

        assert_eq!(format_authors(&[]), "");
        assert_eq!(format_authors(&[a.clone()]), "S. Miyamoto");
        assert_eq!(
            format_authors(&[a.clone(), b.clone()]),
            "S. Miyamoto and K. Kondo"
        );
        assert_eq!(
            format_authors(&[a, b, c]),
            "S. Miyamoto, K. Kondo, H. Tanaka"
        );
    }
}
