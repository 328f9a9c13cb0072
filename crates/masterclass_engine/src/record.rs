/* 📖 # Why decode records leniently?

The query index is produced by the site's publishing pipeline and its entries
are not guaranteed to carry every column. A record with a numeric tag or an
empty description must still be searchable, so every optional field degrades
to "absent" instead of failing the whole index.
*/

use serde_json::{Map, Value};

/// One entry of the query index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultRecord {
    path: String,
    title: Option<String>,
    header: Option<String>,
    description: Option<String>,
    image: Option<String>,
    instructor: Option<String>,
    speaker_name: Option<String>,
    category: Option<String>,
    tags: Option<String>,
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(value)) if !value.is_empty() => Some(value.clone()),
        _ => None,
    }
}

impl ResultRecord {
    /// Create a record with only a path.
    ///
    /// ```
    /// use masterclass_engine::ResultRecord;
    ///
    /// let record = ResultRecord::new("/sessions/keynote").with_header("Opening Keynote");
    /// assert_eq!(record.header_text(), "Opening Keynote");
    /// ```
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Decode a record from one element of the index `data` array.
    ///
    /// Returns `None` if the element is not a JSON object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            path: string_field(object, "path").unwrap_or_default(),
            title: string_field(object, "title"),
            header: string_field(object, "header"),
            description: string_field(object, "description"),
            image: string_field(object, "image"),
            instructor: string_field(object, "instructor"),
            speaker_name: string_field(object, "speaker-name"),
            category: string_field(object, "category"),
            tags: string_field(object, "tags"),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn instructor(&self) -> Option<&str> {
        self.instructor.as_deref()
    }

    pub fn speaker_name(&self) -> Option<&str> {
        self.speaker_name.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    /// The text searched for the header tier: `header`, else `title`, else empty.
    pub fn header_text(&self) -> &str {
        self.header().or(self.title()).unwrap_or("")
    }

    /// The last segment of the path, e.g. `keynote` for `/sessions/keynote`.
    pub fn path_suffix(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// Lowercased, space-joined text searched for the metadata tier.
    pub fn metadata_text(&self) -> String {
        [
            self.title(),
            self.description(),
            self.instructor(),
            self.speaker_name(),
            self.category(),
            self.tags(),
            Some(self.path_suffix()),
        ]
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = Some(instructor.into());
        self
    }

    pub fn with_speaker_name(mut self, speaker_name: impl Into<String>) -> Self {
        self.speaker_name = Some(speaker_name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_reads_all_fields() {
        let record = ResultRecord::from_json(&json!({
            "path": "/labs/edge-delivery",
            "title": "Edge Delivery Lab",
            "header": "Hands-on: Edge Delivery",
            "description": "Build a site",
            "image": "/media/lab.png",
            "instructor": "Sam Rivera",
            "speaker-name": "Jo Chen",
            "category": "Lab",
            "tags": "aem, cdn",
        }))
        .unwrap();

        assert_eq!(record.path(), "/labs/edge-delivery");
        assert_eq!(record.header_text(), "Hands-on: Edge Delivery");
        assert_eq!(record.speaker_name(), Some("Jo Chen"));
        assert_eq!(record.tags(), Some("aem, cdn"));
    }

    #[test]
    fn test_from_json_is_lenient() {
        let record = ResultRecord::from_json(&json!({
            "title": "Only a title",
            "header": "",
            "description": 42,
            "tags": ["a", "b"],
        }))
        .unwrap();

        assert_eq!(record.path(), "");
        assert_eq!(record.header(), None);
        assert_eq!(record.header_text(), "Only a title");
        assert_eq!(record.description(), None);
        assert_eq!(record.tags(), None);
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert_eq!(ResultRecord::from_json(&json!("a string")), None);
        assert_eq!(ResultRecord::from_json(&json!(null)), None);
        assert_eq!(ResultRecord::from_json(&json!([1, 2])), None);
    }

    #[test]
    fn test_header_text_falls_back_to_empty() {
        assert_eq!(ResultRecord::new("/x").header_text(), "");
    }

    #[test]
    fn test_metadata_text_joins_present_fields() {
        let record = ResultRecord::new("/sessions/Data-Mesh")
            .with_title("Data Mesh")
            .with_instructor("Ana Lopez")
            .with_category("Talk");

        assert_eq!(record.metadata_text(), "data mesh ana lopez talk data-mesh");
    }

    #[test]
    fn test_metadata_text_skips_empty_path_suffix() {
        let record = ResultRecord::new("/sessions/").with_description("Intro");
        assert_eq!(record.path_suffix(), "");
        assert_eq!(record.metadata_text(), "intro");
    }
}
