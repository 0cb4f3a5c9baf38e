use crate::error::{MonitorError, MonitorResult};
use std::collections::{BTreeSet, HashSet};

/// Longest keyword (in characters) the keywords table accepts
pub const MAX_KEYWORD_LEN: usize = 50;

/// Canonical form of a keyword: trimmed and lowercased.
///
/// An empty result means "no keyword" and must not be stored.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Reject a normalized keyword the keywords table cannot hold
pub fn check_length(name: &str) -> MonitorResult<()> {
    if name.chars().count() > MAX_KEYWORD_LEN {
        return Err(MonitorError::Validation(format!(
            "keyword '{}' is longer than {} characters",
            name, MAX_KEYWORD_LEN
        )));
    }
    Ok(())
}

/// Normalize every name, drop empties and repeated names, keep first-seen order
pub fn normalize_all<I, S>(raw_names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw_names
        .into_iter()
        .map(|raw| normalize(raw.as_ref()))
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Deduplicated, sorted, comma-joined keyword string appended to search queries
pub fn keyword_clause<I, S>(raw_names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw_names
        .into_iter()
        .map(|raw| normalize(raw.as_ref()))
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Foo Bar "), "foo bar");
        assert_eq!(normalize("ПРИВЕТ"), "привет");
        assert_eq!(normalize(" \t\n"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["Foo", " bar ", "", "  ", "MiXeD CaSe\t", "straße", "İstanbul"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn test_normalize_all_dedupes_in_order() {
        let names = normalize_all(["Foo", " bar ", "foo", "", "BAR"]);
        assert_eq!(names, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn test_check_length_counts_characters() {
        assert!(check_length(&"я".repeat(MAX_KEYWORD_LEN)).is_ok());
        let err = check_length(&"x".repeat(MAX_KEYWORD_LEN + 1)).unwrap_err();
        assert!(matches!(err, MonitorError::Validation(_)));
    }

    #[test]
    fn test_keyword_clause_sorted_and_unique() {
        assert_eq!(keyword_clause(["zeta", " Alpha", "alpha", "  "]), "alpha,zeta");
        assert_eq!(keyword_clause(Vec::<String>::new()), "");
    }
}
