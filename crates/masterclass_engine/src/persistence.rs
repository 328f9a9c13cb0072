/* 📖 # Why is the reflected query a collaborator?

The search box mirrors its query into the page address (`?q=...`) so a search
can be shared and restored on reload. The controller does not own that address;
it only reads, writes and clears the query through `QueryPersistence`. Tests
use `MemoryQueryState`; `AddressBar` keeps a URL string in sync the way the
browser's history API would.
*/

use parking_lot::Mutex;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Storage for the current search query.
pub trait QueryPersistence: std::fmt::Debug + Send + Sync {
    /// The persisted query, if any.
    fn read(&self) -> Option<String>;
    fn write(&self, query: &str);
    fn clear(&self);
}

/// Keeps the query in memory.
#[derive(Debug, Default)]
pub struct MemoryQueryState {
    query: Mutex<Option<String>>,
}

impl MemoryQueryState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueryPersistence for MemoryQueryState {
    fn read(&self) -> Option<String> {
        self.query.lock().clone()
    }

    fn write(&self, query: &str) {
        *self.query.lock() = Some(query.to_string());
    }

    fn clear(&self) {
        *self.query.lock() = None;
    }
}

/// Characters left unescaped in form-encoded query values.
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b' ');

const QUERY_PARAM: &str = "q";

/// Mirrors the query into the `q` parameter of a URL.
///
/// Other query parameters and the fragment are preserved.
///
/// ```
/// use masterclass_engine::{AddressBar, QueryPersistence};
///
/// let address = AddressBar::new("https://site.example/search?lang=en");
/// address.write("edge delivery");
/// assert_eq!(address.url(), "https://site.example/search?lang=en&q=edge+delivery");
/// assert_eq!(address.read().as_deref(), Some("edge delivery"));
/// ```
#[derive(Debug)]
pub struct AddressBar {
    url: Mutex<String>,
}

/// A URL split into the part before `?`, its raw query pairs and the fragment.
struct UrlParts<'a> {
    base: &'a str,
    params: Vec<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    fn parse(url: &'a str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let (base, query) = rest.split_once('?').unwrap_or((rest, ""));
        let params = query.split('&').filter(|param| !param.is_empty()).collect();
        Self {
            base,
            params,
            fragment,
        }
    }

    fn is_query_param(param: &str) -> bool {
        param.split_once('=').map_or(param, |(key, _)| key) == QUERY_PARAM
    }

    fn to_url(&self, query_param: Option<&str>) -> String {
        let mut params: Vec<&str> = Vec::with_capacity(self.params.len() + 1);
        let mut placed = query_param.is_none();
        for &param in &self.params {
            if Self::is_query_param(param) {
                if let (false, Some(replacement)) = (placed, query_param) {
                    params.push(replacement);
                    placed = true;
                }
            } else {
                params.push(param);
            }
        }
        if let (false, Some(replacement)) = (placed, query_param) {
            params.push(replacement);
        }

        let mut url = self.base.to_string();
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        if let Some(fragment) = self.fragment {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }
}

pub(crate) fn decode_form_value(value: &str) -> String {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn encode_form_value(value: &str) -> String {
    utf8_percent_encode(value, FORM_VALUE)
        .to_string()
        .replace(' ', "+")
}

impl AddressBar {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Mutex::new(url.into()),
        }
    }

    /// The current URL.
    pub fn url(&self) -> String {
        self.url.lock().clone()
    }
}

impl QueryPersistence for AddressBar {
    fn read(&self) -> Option<String> {
        let url = self.url.lock();
        UrlParts::parse(&url)
            .params
            .into_iter()
            .find(|param| UrlParts::is_query_param(param))
            .map(|param| decode_form_value(param.split_once('=').map_or("", |(_, value)| value)))
            .filter(|query| !query.is_empty())
    }

    fn write(&self, query: &str) {
        let mut url = self.url.lock();
        let replacement = format!("{}={}", QUERY_PARAM, encode_form_value(query));
        let updated = UrlParts::parse(&url).to_url(Some(&replacement));
        *url = updated;
    }

    fn clear(&self) {
        let mut url = self.url.lock();
        let updated = UrlParts::parse(&url).to_url(None);
        *url = updated;
    }
}
