/* 📖 # How does highlighting stay Unicode-safe?

Terms are lowercase, but the displayed text keeps its original case. Lowercasing
can change byte lengths ("İ" lowercases to two chars), so offsets found in the
lowercased text cannot be reused on the original directly. The text is folded
char by char while recording where each original char starts in the folded
string. A hit only counts if it starts and ends on such a boundary, which maps
it back onto whole original chars and never splits one.
*/

/// A run of text that either matched a search term or did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Matched(String),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain(text) | Segment::Matched(text) => text,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Segment::Matched(_))
    }
}

/// A piece of displayed text, possibly split into highlighted segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextElement {
    segments: Vec<Segment>,
}

impl TextElement {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Plain(text)]
        };
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The full text content, regardless of highlighting.
    pub fn text(&self) -> String {
        self.segments.iter().map(Segment::text).collect()
    }

    pub fn is_highlighted(&self) -> bool {
        self.segments.iter().any(Segment::is_matched)
    }
}

/// Lowercase a term the way [`FoldedText`] lowercases text.
///
/// `str::to_lowercase` turns a word-final `Σ` into `ς` while per-char folding
/// yields `σ`, so both sides use `σ`. The two forms have the same UTF-8 length.
fn fold_term(term: &str) -> String {
    term.to_lowercase().replace('ς', "σ")
}

/// Lowercased copy of a text plus the folded offset of every original char boundary.
struct FoldedText {
    folded: String,
    // (folded offset, original offset), strictly increasing, ends with both lengths
    boundaries: Vec<(usize, usize)>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut boundaries = Vec::with_capacity(text.len() + 1);
        for (offset, c) in text.char_indices() {
            boundaries.push((folded.len(), offset));
            folded.extend(c.to_lowercase().map(|c| if c == 'ς' { 'σ' } else { c }));
        }
        boundaries.push((folded.len(), text.len()));
        Self { folded, boundaries }
    }

    fn original_offset(&self, folded_offset: usize) -> Option<usize> {
        self.boundaries
            .binary_search_by_key(&folded_offset, |&(folded, _)| folded)
            .ok()
            .map(|idx| self.boundaries[idx].1)
    }

    /// Non-overlapping occurrences of `term` as original byte ranges.
    fn find_all(&self, term: &str) -> Vec<(usize, usize)> {
        let mut hits = Vec::new();
        let mut start = 0;
        while let Some(found) = self.folded[start..].find(term) {
            let folded_start = start + found;
            let folded_end = folded_start + term.len();
            match (
                self.original_offset(folded_start),
                self.original_offset(folded_end),
            ) {
                (Some(hit_start), Some(hit_end)) => {
                    hits.push((hit_start, hit_end));
                    start = folded_end;
                }
                _ => {
                    // Partial char expansion; retry from the next folded char.
                    let step = self.folded[folded_start..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
                    start = folded_start + step;
                }
            }
            if start >= self.folded.len() {
                break;
            }
        }
        hits
    }
}

/// Split `text` into plain and matched segments for `terms`.
///
/// Returns `None` if no term occurs. Where hits overlap, the one starting
/// first wins; on equal start, the earlier term wins.
///
/// ```
/// use masterclass_engine::{Segment, highlight};
///
/// let segments = highlight(&["ai".to_string()], "AI and Data").unwrap();
/// assert_eq!(
///     segments,
///     vec![
///         Segment::Matched("AI".to_string()),
///         Segment::Plain(" and Data".to_string()),
///     ]
/// );
/// ```
pub fn highlight(terms: &[String], text: &str) -> Option<Vec<Segment>> {
    let folded = FoldedText::new(text);
    let mut hits: Vec<(usize, usize)> = terms
        .iter()
        .map(|term| fold_term(term))
        .filter(|term| !term.is_empty())
        .flat_map(|term| folded.find_all(&term))
        .collect();
    if hits.is_empty() {
        return None;
    }
    hits.sort_by_key(|&(start, _)| start);

    let mut segments = Vec::new();
    let mut current = 0;
    for (start, end) in hits {
        if start < current {
            continue;
        }
        if start > current {
            segments.push(Segment::Plain(text[current..start].to_string()));
        }
        segments.push(Segment::Matched(text[start..end].to_string()));
        current = end;
    }
    if current < text.len() {
        segments.push(Segment::Plain(text[current..].to_string()));
    }
    Some(segments)
}

/// Highlight each element in place; elements without hits are left untouched.
pub fn highlight_elements(terms: &[String], elements: &mut [TextElement]) {
    for element in elements.iter_mut() {
        let text = element.text();
        if text.is_empty() {
            continue;
        }
        if let Some(segments) = highlight(terms, &text) {
            element.segments = segments;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn render(segments: &[Segment]) -> String {
        segments
            .iter()
            .map(|s| match s {
                Segment::Plain(text) => text.clone(),
                Segment::Matched(text) => format!("[{}]", text),
            })
            .collect()
    }

    #[test]
    fn test_ai_and_data() {
        let segments = highlight(&terms(&["ai"]), "AI and Data").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Matched("AI".to_string()),
                Segment::Plain(" and Data".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_hits_returns_none() {
        assert_eq!(highlight(&terms(&["cloud"]), "AI and Data"), None);
        assert_eq!(highlight(&[], "AI and Data"), None);
    }

    #[test]
    fn test_every_occurrence_is_marked() {
        let segments = highlight(&terms(&["data"]), "Data in, data out: DATA").unwrap();
        assert_eq!(render(&segments), "[Data] in, [data] out: [DATA]");
    }

    #[test]
    fn test_overlap_first_offset_wins() {
        let segments = highlight(&terms(&["data", "atab"]), "Databases").unwrap();
        assert_eq!(render(&segments), "[Data]bases");
    }

    #[test]
    fn test_equal_offset_earlier_term_wins() {
        let segments = highlight(&terms(&["lab", "labs"]), "Labs").unwrap();
        assert_eq!(render(&segments), "[Lab]s");
    }

    #[test]
    fn test_non_overlapping_within_one_term() {
        let segments = highlight(&terms(&["aa"]), "aaaa a").unwrap();
        assert_eq!(render(&segments), "[aa][aa] a");
    }

    #[test]
    fn test_segments_reproduce_original_text() {
        let text = "Ünïcode Straße and ÜBER-fast İstanbul";
        let segments = highlight(&terms(&["über", "straße", "i\u{307}stanbul", "a"]), text).unwrap();
        let joined: String = segments.iter().map(Segment::text).collect();
        assert_eq!(joined, text);
        assert_eq!(
            render(&segments),
            "Ünïcode [Straße] [a]nd [ÜBER]-f[a]st [İstanbul]"
        );
    }

    #[test]
    fn test_never_splits_a_char_expansion() {
        // "İ" lowercases to "i" plus a combining dot; "i" alone is not a hit.
        assert_eq!(highlight(&terms(&["i"]), "İ"), None);
    }

    #[test]
    fn test_final_sigma_matches_extracted_terms() {
        let terms = crate::terms::extract_terms("ΟΔΟΣ");
        assert_eq!(terms, ["οδος"]);

        let segments = highlight(&terms, "ΟΔΟΣ").unwrap();
        assert_eq!(render(&segments), "[ΟΔΟΣ]");
        let segments = highlight(&terms, "η οδος μας").unwrap();
        assert_eq!(render(&segments), "η [οδος] μας");
    }

    #[test]
    fn test_highlight_elements_leaves_unmatched_untouched() {
        let mut elements = vec![
            TextElement::new("Opening Keynote"),
            TextElement::new("Closing remarks"),
            TextElement::new(""),
        ];
        highlight_elements(&terms(&["keynote"]), &mut elements);

        assert!(elements[0].is_highlighted());
        assert_eq!(elements[0].text(), "Opening Keynote");
        assert_eq!(elements[1], TextElement::new("Closing remarks"));
        assert!(elements[2].segments().is_empty());
    }
}
