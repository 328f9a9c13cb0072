/* 📖 # Why a single ApiService?

One HttpService is registered with the server and routes by path:

- `/api/search?q={query}` runs the search pipeline and returns ranked cards
- `/api/feedback` relays feedback form submissions

Unknown paths get a JSON 404. Errors the service cannot express as a response
(such as a serialization failure) are returned as `Err` and become a 599.
*/

use serde::Serialize;
use tracing::debug;

use masterclass_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatusCode};
use masterclass_base::{MasterclassResult, PalHandle};

use crate::api::feedback::FeedbackService;
use crate::cards::{CardRow, render_card_html};
use crate::config::Config;
use crate::persistence::decode_form_value;
use crate::ranking::rank;
use crate::source::{IndexSource, fetch_results};
use crate::terms::extract_terms;

/// One ranked result in a search response.
#[derive(Debug, Serialize)]
struct SearchResultResponse {
    path: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    tier: &'static str,
    html: String,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    status: &'static str,
    results: Vec<SearchResultResponse>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

fn serialize_json_response<T: Serialize>(
    status: HttpStatusCode,
    data: &T,
) -> MasterclassResult<HttpResponse> {
    serde_json::to_string(data)
        .map(|json| HttpResponse::json(status, json))
        .map_err(|e| masterclass_base::err!("JSON serialization error: {}", e))
}

/// The value of the `q` parameter in a raw query string.
fn query_param(query: Option<&str>) -> String {
    query
        .unwrap_or("")
        .split('&')
        .find_map(|param| match param.split_once('=') {
            Some(("q", value)) => Some(decode_form_value(value)),
            None if param == "q" => Some(String::new()),
            _ => None,
        })
        .unwrap_or_default()
}

/// HTTP service exposing search and feedback.
#[derive(Debug, Clone)]
pub struct ApiService {
    pal: PalHandle,
    source: IndexSource,
    min_query_length: usize,
    feedback: FeedbackService,
}

impl ApiService {
    pub fn new(pal: PalHandle, config: &Config) -> MasterclassResult<Self> {
        let feedback = FeedbackService::new(pal.clone(), config.feedback.webhook_url.clone())?;
        Ok(Self {
            pal,
            source: config.search.index_source(),
            min_query_length: config.search.min_query_length,
            feedback,
        })
    }

    fn handle_search_request(&self, request: &HttpRequest) -> MasterclassResult<HttpResponse> {
        if request.method() != HttpMethod::Get {
            return serialize_json_response(
                HttpStatusCode::METHOD_NOT_ALLOWED,
                &ErrorResponse {
                    error: "Method not allowed",
                },
            );
        }

        let query = query_param(request.query());
        if query.chars().count() < self.min_query_length {
            debug!(query = %query, "search query below minimum length");
            return serialize_json_response(
                HttpStatusCode::OK,
                &SearchResponse {
                    query,
                    status: "idle",
                    results: Vec::new(),
                },
            );
        }

        let terms = extract_terms(&query);
        // Failures are logged by the source adapter and shown as no results.
        let records = fetch_results(&self.pal, &self.source).unwrap_or_default();
        let results: Vec<SearchResultResponse> = rank(&terms, &records)
            .into_iter()
            .map(|matched| {
                let row = CardRow::from_record(&terms, matched.record);
                SearchResultResponse {
                    path: matched.record.path().to_string(),
                    title: row.body.title_link.text.text(),
                    description: matched.record.description().map(str::to_string),
                    tier: matched.tier.as_str(),
                    html: render_card_html(&row),
                }
            })
            .collect();
        debug!(query = %query, results = results.len(), "search completed");

        let status = if results.is_empty() { "empty" } else { "rendered" };
        serialize_json_response(
            HttpStatusCode::OK,
            &SearchResponse {
                query,
                status,
                results,
            },
        )
    }
}

impl HttpService for ApiService {
    fn handle_request(&self, request: HttpRequest) -> MasterclassResult<HttpResponse> {
        match request.path() {
            "/api/search" => self.handle_search_request(&request),
            "/api/feedback" => self.feedback.handle(&request),
            path => {
                debug!(path, "no route for request");
                serialize_json_response(HttpStatusCode::NOT_FOUND, &ErrorResponse { error: "Not found" })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use masterclass_base::pal::http::HttpServerConfig;
    use masterclass_base::{MockPal, Pal};

    const INDEX_URL: &str = "https://site.example/query-index.json";
    const INDEX: &str = r#"{"data":[
        {"path":"/sessions/other","title":"Other","description":"See the keynote talk"},
        {"path":"/sessions/keynote","header":"Opening Keynote","title":"Opening Keynote"}
    ]}"#;

    fn create_test_service() -> (MockPal, ApiService) {
        let mock = MockPal::new();
        mock.add_response(INDEX_URL, HttpResponse::json(HttpStatusCode::OK, INDEX));
        let config = Config::parse(
            r#"
[search]
source = "/query-index.json"
base_url = "https://site.example"
"#,
        )
        .unwrap();
        let service = ApiService::new(PalHandle::new(mock.clone()), &config).unwrap();
        (mock, service)
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param(Some("q=ai+data")), "ai data");
        assert_eq!(query_param(Some("page=2&q=caf%C3%A9")), "café");
        assert_eq!(query_param(Some("quick=1")), "");
        assert_eq!(query_param(None), "");
    }

    #[test]
    fn test_search_endpoint() {
        let (_mock, service) = create_test_service();
        let response = service
            .handle_request(HttpRequest::get("/api/search?q=keynote"))
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
        assert_eq!(response.headers().get("Content-Type"), Some("application/json"));
        let body: serde_json::Value =
            serde_json::from_slice(response.body().as_bytes()).unwrap();
        expect![[r#"
            {
              "query": "keynote",
              "results": [
                {
                  "html": "<li><div class=\"cards-card-body\"><p><strong><a href=\"/sessions/keynote\">Opening <mark>Keynote</mark></a></strong></p></div></li>",
                  "path": "/sessions/keynote",
                  "tier": "header",
                  "title": "Opening Keynote"
                },
                {
                  "description": "See the keynote talk",
                  "html": "<li><div class=\"cards-card-body\"><p><strong><a href=\"/sessions/other\">Other</a></strong></p><p>See the <mark>keynote</mark> talk</p></div></li>",
                  "path": "/sessions/other",
                  "tier": "metadata",
                  "title": "Other"
                }
              ],
              "status": "rendered"
            }"#]]
        .assert_eq(&serde_json::to_string_pretty(&body).unwrap());
    }

    #[test]
    fn test_short_query_is_idle_without_fetch() {
        let (mock, service) = create_test_service();
        let response = service
            .handle_request(HttpRequest::get("/api/search?q=ke"))
            .unwrap();

        assert_eq!(
            response.body().as_str().unwrap(),
            r#"{"query":"ke","status":"idle","results":[]}"#
        );
        assert!(mock.fetched_requests().is_empty());
    }

    #[test]
    fn test_failed_fetch_is_empty() {
        let mock = MockPal::new();
        mock.add_response(INDEX_URL, HttpResponse::new(HttpStatusCode::BAD_GATEWAY));
        let mut config = Config::default();
        config.search.source = INDEX_URL.to_string();
        let service = ApiService::new(PalHandle::new(mock), &config).unwrap();

        let response = service
            .handle_request(HttpRequest::get("/api/search?q=keynote"))
            .unwrap();
        assert_eq!(
            response.body().as_str().unwrap(),
            r#"{"query":"keynote","status":"empty","results":[]}"#
        );
    }

    #[test]
    fn test_search_rejects_post() {
        let (_mock, service) = create_test_service();
        let response = service
            .handle_request(HttpRequest::post_json("/api/search?q=keynote", "{}"))
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_feedback_route() {
        let (_mock, service) = create_test_service();
        let response = service
            .handle_request(HttpRequest::post_json("/api/feedback", "{}"))
            .unwrap();
        // No webhook configured in this service.
        assert_eq!(response.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body().as_str().unwrap(),
            r#"{"error":"Worker not configured"}"#
        );
    }

    #[test]
    fn test_unknown_path() {
        let (_mock, service) = create_test_service();
        let response = service.handle_request(HttpRequest::get("/api/other")).unwrap();
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
        assert_eq!(response.body().as_str().unwrap(), r#"{"error":"Not found"}"#);
    }

    #[test]
    fn test_served_through_pal() {
        let (mock, service) = create_test_service();
        let handle = mock
            .start_http_server(Box::new(service), HttpServerConfig::default())
            .unwrap();

        let response = mock
            .simulate_request(handle.port(), HttpRequest::get("/api/search?q=opening"))
            .unwrap();
        assert!(response.body().as_str().unwrap().contains(r#""status":"rendered""#));
    }
}
