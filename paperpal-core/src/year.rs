//! Year extraction from free-form date strings.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new("[0-9]+").expect("valid digit-run regex");
}

/// No run of exactly four digits in a date string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not parse year in {text:?}")]
pub struct YearNotFoundError {
    pub text: String,
}

/// Return the first maximal run of exactly four ASCII digits in `text`.
///
/// ```
/// use paperpal_core::year::extract_year;
/// assert_eq!(extract_year("06/2012").unwrap(), 2012);
/// ```
pub fn extract_year(text: &str) -> Result<u32, YearNotFoundError> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
        .ok_or_else(|| YearNotFoundError {
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_year() {
        assert_eq!(extract_year("2013"), Ok(2013));
    }

    #[test]
    fn test_month_and_year() {
        assert_eq!(extract_year("April 2014"), Ok(2014));
        assert_eq!(extract_year("06/2012"), Ok(2012));
    }

    #[test]
    fn test_first_run_wins() {
        assert_eq!(extract_year("2016-05-20"), Ok(2016));
        assert_eq!(extract_year("1999/2000"), Ok(1999));
    }

    #[test]
    fn test_longer_runs_are_not_years() {
        assert_eq!(extract_year("12345 then 1987"), Ok(1987));
        assert!(extract_year("123456").is_err());
    }

    #[test]
    fn test_no_year() {
        let err = extract_year("n.d.").unwrap_err();
        assert_eq!(err.text, "n.d.");
        assert!(extract_year("").is_err());
        assert!(extract_year("06/12").is_err());
    }
}
