/* 📖 # How are results ranked?

Matching is plain case-insensitive substring search, split into two tiers:

1. **Header tier**: every term occurs in the record's header text.
2. **Metadata tier**: every term occurs in the joined metadata text
   (title, description, people, category, tags and the last path segment).

A record lands in the first tier it qualifies for. Within a tier records are
ordered by their match offset: for each term the position of its first
occurrence, and the offset is the largest of those positions. Records whose
terms all appear early sort first. The sort is stable, so equal offsets keep
index order.
*/

use crate::record::ResultRecord;

/// Which text a record matched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Header,
    Metadata,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Header => "header",
            Tier::Metadata => "metadata",
        }
    }
}

/// A record that matched the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a> {
    pub record: &'a ResultRecord,
    pub tier: Tier,
    pub offset: usize,
}

/// Largest first-occurrence char offset over all terms, or `None` if a term is missing.
fn match_offset(terms: &[String], haystack: &str) -> Option<usize> {
    terms.iter().try_fold(0, |offset, term| {
        haystack
            .find(term.as_str())
            .map(|idx| offset.max(haystack[..idx].chars().count()))
    })
}

/// Rank `records` against `terms`.
///
/// Terms are expected to be lowercase, as produced by [`crate::extract_terms`].
pub fn rank<'a>(terms: &[String], records: &'a [ResultRecord]) -> Vec<Match<'a>> {
    if terms.is_empty() {
        return Vec::new();
    }

    let mut header_tier = Vec::new();
    let mut metadata_tier = Vec::new();
    for record in records {
        if let Some(offset) = match_offset(terms, &record.header_text().to_lowercase()) {
            header_tier.push(Match {
                record,
                tier: Tier::Header,
                offset,
            });
        } else if let Some(offset) = match_offset(terms, &record.metadata_text()) {
            metadata_tier.push(Match {
                record,
                tier: Tier::Metadata,
                offset,
            });
        }
    }

    header_tier.sort_by_key(|m| m.offset);
    metadata_tier.sort_by_key(|m| m.offset);
    header_tier.extend(metadata_tier);
    header_tier
}

/// The ranked records without match details.
pub fn filter<'a>(terms: &[String], records: &'a [ResultRecord]) -> Vec<&'a ResultRecord> {
    rank(terms, records).into_iter().map(|m| m.record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::extract_terms;

    fn paths(records: &[&ResultRecord]) -> Vec<String> {
        records.iter().map(|r| r.path().to_string()).collect()
    }

    #[test]
    fn test_empty_terms_returns_no_results() {
        let records = vec![ResultRecord::new("/a").with_title("Anything")];
        assert!(rank(&[], &records).is_empty());
    }

    #[test]
    fn test_keynote_header_before_metadata() {
        let records = vec![
            ResultRecord::new("/a").with_header("Opening Keynote"),
            ResultRecord::new("/b")
                .with_title("Other")
                .with_description("See the keynote talk"),
        ];

        let ranked = rank(&extract_terms("keynote"), &records);
        assert_eq!(paths(&ranked.iter().map(|m| m.record).collect::<Vec<_>>()), ["/a", "/b"]);
        assert_eq!(ranked[0].tier, Tier::Header);
        assert_eq!(ranked[0].offset, 8);
        assert_eq!(ranked[1].tier, Tier::Metadata);
    }

    #[test]
    fn test_header_requires_every_term() {
        let records = vec![
            ResultRecord::new("/partial")
                .with_title("Cloud Basics")
                .with_description("native patterns"),
            ResultRecord::new("/full").with_title("Cloud Native"),
        ];

        let ranked = rank(&extract_terms("cloud native"), &records);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].record.path(), "/full");
        assert_eq!(ranked[0].tier, Tier::Header);
        assert_eq!(ranked[1].record.path(), "/partial");
        assert_eq!(ranked[1].tier, Tier::Metadata);
    }

    #[test]
    fn test_header_tier_precedes_metadata_regardless_of_offset() {
        let records = vec![
            ResultRecord::new("/meta").with_title("x").with_tags("rust"),
            ResultRecord::new("/late").with_header("A very long header about rust"),
        ];

        let found = filter(&extract_terms("rust"), &records);
        assert_eq!(paths(&found), ["/late", "/meta"]);
    }

    #[test]
    fn test_orders_by_offset_within_tier() {
        let records = vec![
            ResultRecord::new("/third").with_title("Intro to the data lab"),
            ResultRecord::new("/first").with_title("Data Lab"),
            ResultRecord::new("/second").with_title("The Data Lab"),
        ];

        let found = filter(&extract_terms("lab data"), &records);
        assert_eq!(paths(&found), ["/first", "/second", "/third"]);
    }

    #[test]
    fn test_offset_is_largest_first_occurrence() {
        let records = vec![ResultRecord::new("/a").with_title("ai and data and ai")];
        let ranked = rank(&extract_terms("data ai"), &records);
        assert_eq!(ranked[0].offset, 7);
    }

    #[test]
    fn test_offset_counts_chars_not_bytes() {
        let records = vec![
            ResultRecord::new("/ascii").with_title("abcde x"),
            ResultRecord::new("/accents").with_title("ééé x"),
        ];

        let ranked: Vec<(&str, usize)> = rank(&extract_terms("x"), &records)
            .iter()
            .map(|m| (m.record.path(), m.offset))
            .collect();
        assert_eq!(ranked, [("/accents", 4), ("/ascii", 6)]);
    }

    #[test]
    fn test_equal_offsets_keep_input_order() {
        let records = vec![
            ResultRecord::new("/one").with_title("Workshop A"),
            ResultRecord::new("/two").with_title("Workshop B"),
            ResultRecord::new("/three").with_title("Workshop C"),
        ];

        let found = filter(&extract_terms("workshop"), &records);
        assert_eq!(paths(&found), ["/one", "/two", "/three"]);
    }

    #[test]
    fn test_matches_path_suffix_and_people() {
        let records = vec![
            ResultRecord::new("/labs/exercise-six").with_title("Sixth"),
            ResultRecord::new("/sessions/closing").with_speaker_name("Priya Natarajan"),
            ResultRecord::new("/sessions/unrelated").with_title("Nothing here"),
        ];

        assert_eq!(paths(&filter(&extract_terms("exercise"), &records)), ["/labs/exercise-six"]);
        assert_eq!(paths(&filter(&extract_terms("PRIYA"), &records)), ["/sessions/closing"]);
    }

    #[test]
    fn test_record_appears_in_one_tier_only() {
        let records = vec![
            ResultRecord::new("/both")
                .with_title("Search Lab")
                .with_description("search everywhere"),
        ];

        let ranked = rank(&extract_terms("search"), &records);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].tier, Tier::Header);
    }

    #[test]
    fn test_no_match_is_dropped() {
        let records = vec![ResultRecord::new("/a").with_title("Kubernetes")];
        assert!(filter(&extract_terms("terraform"), &records).is_empty());
    }
}
