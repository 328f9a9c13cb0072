/* 📖 # Why does the source adapter fail closed?

The index is fetched once per query. If it cannot be fetched or does not have
the expected `{ "data": [...] }` shape, the search shows no results rather than
partial or stale ones. The failure kind is still reported to the caller so it
can be logged; the user only ever sees "No results found."
*/

use std::fmt;
use std::io::Read;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use masterclass_base::pal::http::HttpRequest;
use masterclass_base::{FilePath, PalHandle};

use crate::record::ResultRecord;

/// Where the query index is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    /// Absolute `http://` or `https://` URL.
    Remote(String),
    /// File relative to the PAL base directory.
    Local(FilePath),
}

impl IndexSource {
    /// Resolve a configured source.
    ///
    /// Absolute URLs are used as-is. Site-relative paths are joined onto
    /// `base_url` when one is configured and read from disk otherwise.
    ///
    /// ```
    /// use masterclass_engine::IndexSource;
    ///
    /// assert_eq!(
    ///     IndexSource::resolve("/query-index.json", Some("https://site.example/")),
    ///     IndexSource::Remote("https://site.example/query-index.json".to_string())
    /// );
    /// ```
    pub fn resolve(source: &str, base_url: Option<&str>) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            return IndexSource::Remote(source.to_string());
        }
        match base_url {
            Some(base) => IndexSource::Remote(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                source.trim_start_matches('/')
            )),
            None => IndexSource::Local(FilePath::from(source)),
        }
    }
}

impl fmt::Display for IndexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSource::Remote(url) => write!(f, "{}", url),
            IndexSource::Local(path) => write!(f, "file:{}", path),
        }
    }
}

/// Why the index could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The request could not be made or the file could not be read.
    Transport(String),
    /// The server answered with a non-success status.
    Status(u16),
    /// The body is not JSON.
    Body(String),
    /// The JSON has no `data` array.
    Shape,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Transport(message) => write!(f, "transport failure: {}", message),
            SourceError::Status(code) => write!(f, "unexpected status {}", code),
            SourceError::Body(message) => write!(f, "invalid JSON body: {}", message),
            SourceError::Shape => write!(f, "response has no 'data' array"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Load and decode the query index.
#[instrument(skip(pal), fields(source = %source))]
pub fn fetch_results(
    pal: &PalHandle,
    source: &IndexSource,
) -> Result<Vec<ResultRecord>, SourceError> {
    let result = load_body(pal, source).and_then(|body| parse_index(&body));
    match &result {
        Ok(records) => debug!(count = records.len(), "loaded query index"),
        Err(e) => warn!(error = %e, "failed to load query index"),
    }
    result
}

fn load_body(pal: &PalHandle, source: &IndexSource) -> Result<Vec<u8>, SourceError> {
    match source {
        IndexSource::Remote(url) => {
            let response = pal
                .fetch(HttpRequest::get(url.as_str()))
                .map_err(|e| SourceError::Transport(e.to_string()))?;
            if !response.status().is_success() {
                return Err(SourceError::Status(response.status().as_u16()));
            }
            Ok(response.into_body().into_bytes())
        }
        IndexSource::Local(path) => {
            let mut reader = pal
                .read_file(path)
                .map_err(|e| SourceError::Transport(e.to_string()))?;
            let mut body = Vec::new();
            reader
                .read_to_end(&mut body)
                .map_err(|e| SourceError::Transport(e.to_string()))?;
            Ok(body)
        }
    }
}

/// Decode an index document of the form `{ "data": [ ... ] }`.
///
/// Entries that are not objects are skipped.
pub fn parse_index(body: &[u8]) -> Result<Vec<ResultRecord>, SourceError> {
    let json: Value =
        serde_json::from_slice(body).map_err(|e| SourceError::Body(e.to_string()))?;
    let entries = json
        .get("data")
        .and_then(Value::as_array)
        .ok_or(SourceError::Shape)?;

    let records: Vec<ResultRecord> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let record = ResultRecord::from_json(entry);
            if record.is_none() {
                debug!(index, "skipping index entry that is not an object");
            }
            record
        })
        .collect();
    Ok(records)
}
