/// Split a raw query into lowercase search terms.
///
/// Terms are separated by runs of whitespace; order and duplicates are kept.
///
/// ```
/// use masterclass_engine::extract_terms;
///
/// assert_eq!(extract_terms("  Edge   DELIVERY "), vec!["edge", "delivery"]);
/// assert!(extract_terms("   ").is_empty());
/// ```
pub fn extract_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
