/* 📖 # How are search results presented?

Each ranked record becomes one card row: an optional image column and a body
column holding the title link and the description. Rows are rendered as the
decorated cards markup the site stylesheet expects:

    <div class="cards"><ul>
      <li>
        <div class="cards-card-image"><picture>...</picture></div>
        <div class="cards-card-body"><p><strong><a href>title</a></strong></p><p>desc</p></div>
      </li>
    </ul></div>

Matched segments are wrapped in `<mark>`. Images are served through the
media pipeline as a webp source with a lazily loaded fallback image.
*/

use pulldown_cmark_escape::{escape_href, escape_html};

use crate::highlight::{Segment, TextElement, highlight_elements};
use crate::record::ResultRecord;

/// Markup shown when a query matches nothing.
pub const NO_RESULTS_HTML: &str = r#"<p class="search-status">No results found.</p>"#;

/// Width requested from the media pipeline for card images.
const CARD_IMAGE_WIDTH: u32 = 750;

/// The image column of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageColumn {
    pub src: String,
    pub alt: String,
}

/// The link to the result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleLink {
    pub href: String,
    pub text: TextElement,
}

/// The body column of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyColumn {
    pub title_link: TitleLink,
    pub description: Option<TextElement>,
}

/// One card in the results grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRow {
    pub image: Option<ImageColumn>,
    pub body: BodyColumn,
}

impl CardRow {
    /// Build the card for `record`, highlighting `terms` in title and description.
    pub fn from_record(terms: &[String], record: &ResultRecord) -> Self {
        let image = record.image().map(|src| ImageColumn {
            src: src.to_string(),
            alt: record.title().unwrap_or("").to_string(),
        });

        let mut title = [TextElement::new(record.title().unwrap_or(record.path()))];
        highlight_elements(terms, &mut title);
        let [title] = title;

        let description = record.description().map(|description| {
            let mut elements = [TextElement::new(description)];
            highlight_elements(terms, &mut elements);
            let [element] = elements;
            element
        });

        Self {
            image,
            body: BodyColumn {
                title_link: TitleLink {
                    href: record.path().to_string(),
                    text: title,
                },
                description,
            },
        }
    }
}

/// Build one card row per record, in order.
pub fn build_card_rows(terms: &[String], records: &[&ResultRecord]) -> Vec<CardRow> {
    records
        .iter()
        .map(|record| CardRow::from_record(terms, record))
        .collect()
}

fn push_html(out: &mut String, text: &str) {
    let _ = escape_html(&mut *out, text);
}

fn push_href(out: &mut String, url: &str) {
    let _ = escape_href(&mut *out, url);
}

fn push_text_element(out: &mut String, element: &TextElement) {
    for segment in element.segments() {
        match segment {
            Segment::Plain(text) => push_html(out, text),
            Segment::Matched(text) => {
                out.push_str("<mark>");
                push_html(out, text);
                out.push_str("</mark>");
            }
        }
    }
}

/// Path component of an image reference, without scheme, host, query or fragment.
fn image_pathname(src: &str) -> &str {
    let without_scheme = src
        .split_once("://")
        .map(|(_, rest)| rest.find('/').map_or("/", |idx| &rest[idx..]))
        .unwrap_or(src);
    let end = without_scheme
        .find(['?', '#'])
        .unwrap_or(without_scheme.len());
    &without_scheme[..end]
}

/// Render a `<picture>` with a webp source and a lazily loaded fallback image.
///
/// ```
/// use masterclass_engine::cards::optimized_picture;
///
/// let html = optimized_picture("/media/talk.png?width=2000", "Talk");
/// assert!(html.contains(r#"srcset="/media/talk.png?width=750&amp;format=webply&amp;optimize=medium""#));
/// ```
pub fn optimized_picture(src: &str, alt: &str) -> String {
    let pathname = image_pathname(src);
    let extension = pathname
        .rsplit_once('.')
        .map_or(pathname, |(_, extension)| extension);

    let mut out = String::from(r#"<picture><source type="image/webp" srcset=""#);
    push_href(
        &mut out,
        &format!(
            "{}?width={}&format=webply&optimize=medium",
            pathname, CARD_IMAGE_WIDTH
        ),
    );
    out.push_str(r#""><img loading="lazy" alt=""#);
    push_html(&mut out, alt);
    out.push_str(r#"" src=""#);
    push_href(
        &mut out,
        &format!(
            "{}?width={}&format={}&optimize=medium",
            pathname, CARD_IMAGE_WIDTH, extension
        ),
    );
    out.push_str(r#""></picture>"#);
    out
}

/// Render a single card as an `<li>` element.
pub fn render_card_html(row: &CardRow) -> String {
    let mut out = String::from("<li>");
    if let Some(image) = &row.image {
        out.push_str(r#"<div class="cards-card-image">"#);
        out.push_str(&optimized_picture(&image.src, &image.alt));
        out.push_str("</div>");
    }

    out.push_str(r#"<div class="cards-card-body"><p><strong><a href=""#);
    push_href(&mut out, &row.body.title_link.href);
    out.push_str(r#"">"#);
    push_text_element(&mut out, &row.body.title_link.text);
    out.push_str("</a></strong></p>");
    if let Some(description) = &row.body.description {
        out.push_str("<p>");
        push_text_element(&mut out, description);
        out.push_str("</p>");
    }
    out.push_str("</div></li>");
    out
}

/// Render the cards block, or the no-results status if there are no rows.
pub fn render_cards_html(rows: &[CardRow]) -> String {
    if rows.is_empty() {
        return NO_RESULTS_HTML.to_string();
    }
    let mut out = String::from(r#"<div class="cards"><ul>"#);
    for row in rows {
        out.push_str(&render_card_html(row));
    }
    out.push_str("</ul></div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::extract_terms;
    use expect_test::expect;

    #[test]
    fn test_card_row_shape() {
        let record = ResultRecord::new("/sessions/keynote")
            .with_title("Opening Keynote")
            .with_description("The keynote starts the day")
            .with_image("/media/keynote.jpg");

        let row = CardRow::from_record(&extract_terms("keynote"), &record);

        assert_eq!(
            row.image,
            Some(ImageColumn {
                src: "/media/keynote.jpg".to_string(),
                alt: "Opening Keynote".to_string(),
            })
        );
        assert_eq!(row.body.title_link.href, "/sessions/keynote");
        assert!(row.body.title_link.text.is_highlighted());
        assert!(row.body.description.as_ref().unwrap().is_highlighted());
    }

    #[test]
    fn test_title_falls_back_to_path() {
        let record = ResultRecord::new("/labs/exercise-6");
        let row = CardRow::from_record(&extract_terms("exercise"), &record);

        assert_eq!(row.body.title_link.text.text(), "/labs/exercise-6");
        assert_eq!(row.image, None);
        assert_eq!(row.body.description, None);
    }

    #[test]
    fn test_render_cards_html() {
        let records = [
            ResultRecord::new("/sessions/keynote")
                .with_header("Opening Keynote")
                .with_title("Opening Keynote")
                .with_image("https://site.example/media/keynote.jpg?width=2000#top"),
            ResultRecord::new("/labs/rag")
                .with_title("RAG <Lab> & friends")
                .with_description("Build a keynote demo"),
        ];
        let refs: Vec<&ResultRecord> = records.iter().collect();
        let rows = build_card_rows(&extract_terms("keynote"), &refs);

        expect![[r#"<div class="cards"><ul><li><div class="cards-card-image"><picture><source type="image/webp" srcset="/media/keynote.jpg?width=750&amp;format=webply&amp;optimize=medium"><img loading="lazy" alt="Opening Keynote" src="/media/keynote.jpg?width=750&amp;format=jpg&amp;optimize=medium"></picture></div><div class="cards-card-body"><p><strong><a href="/sessions/keynote">Opening <mark>Keynote</mark></a></strong></p></div></li><li><div class="cards-card-body"><p><strong><a href="/labs/rag">RAG &lt;Lab&gt; &amp; friends</a></strong></p><p>Build a <mark>keynote</mark> demo</p></div></li></ul></div>"#]]
            .assert_eq(&render_cards_html(&rows));
    }

    #[test]
    fn test_render_no_results() {
        assert_eq!(
            render_cards_html(&[]),
            r#"<p class="search-status">No results found.</p>"#
        );
    }

    #[test]
    fn test_image_pathname() {
        assert_eq!(image_pathname("/media/a.png"), "/media/a.png");
        assert_eq!(image_pathname("./media/a.png?width=10"), "./media/a.png");
        assert_eq!(image_pathname("https://cdn.example/m/b.webp#x"), "/m/b.webp");
        assert_eq!(image_pathname("https://cdn.example"), "/");
    }
}
