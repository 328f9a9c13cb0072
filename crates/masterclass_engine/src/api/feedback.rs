/* 📖 # What does the feedback relay do?

The site's feedback form posts `{ fullName, email, feedback }` here. The relay
validates the submission and forwards it as a formatted message to a chat
webhook, so the webhook URL never reaches the browser. Every response carries
permissive CORS headers because the form is served from another origin.
*/

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use masterclass_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpStatusCode};
use masterclass_base::{MasterclassResult, PalHandle};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const MESSAGE_TITLE: &str = "New Feedback Received";

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Serialize)]
struct SuccessBody {
    success: bool,
    message: &'static str,
}

/// A validated feedback submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub full_name: String,
    pub email: String,
    pub feedback: String,
}

impl Feedback {
    /// The chat message posted to the webhook.
    pub fn to_slack_payload(&self) -> Value {
        json!({
            "text": MESSAGE_TITLE,
            "blocks": [
                {
                    "type": "header",
                    "text": { "type": "plain_text", "text": MESSAGE_TITLE },
                },
                {
                    "type": "section",
                    "fields": [
                        { "type": "mrkdwn", "text": format!("*Name:*\n{}", self.full_name) },
                        { "type": "mrkdwn", "text": format!("*Email:*\n{}", self.email) },
                    ],
                },
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": format!("*Feedback:*\n{}", self.feedback) },
                },
            ],
        })
    }
}

fn with_cors(mut response: HttpResponse) -> HttpResponse {
    for (key, value) in CORS_HEADERS {
        response = response.with_header(key, value);
    }
    response
}

fn json_response<T: Serialize>(status: HttpStatusCode, body: &T) -> MasterclassResult<HttpResponse> {
    let json = serde_json::to_string(body)
        .map_err(|e| masterclass_base::err!("JSON serialization error: {}", e))?;
    Ok(with_cors(HttpResponse::json(status, json)))
}

fn error_response(status: HttpStatusCode, error: &'static str) -> MasterclassResult<HttpResponse> {
    debug!(status = %status, error, "rejecting feedback request");
    json_response(status, &ErrorBody { error })
}

fn trimmed_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Relays feedback submissions to the configured webhook.
#[derive(Debug, Clone)]
pub struct FeedbackService {
    pal: PalHandle,
    webhook_url: Option<String>,
    email_pattern: Regex,
}

impl FeedbackService {
    pub fn new(pal: PalHandle, webhook_url: Option<String>) -> MasterclassResult<Self> {
        let email_pattern = Regex::new(EMAIL_PATTERN)
            .map_err(|e| masterclass_base::err!("Invalid email pattern: {}", e))?;
        Ok(Self {
            pal,
            webhook_url,
            email_pattern,
        })
    }

    /// Handle a request to the feedback endpoint.
    pub fn handle(&self, request: &HttpRequest) -> MasterclassResult<HttpResponse> {
        match request.method() {
            HttpMethod::Options => return Ok(with_cors(HttpResponse::no_content())),
            HttpMethod::Post => {}
            _ => return error_response(HttpStatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
        }

        let Some(webhook_url) = self.webhook_url.as_deref() else {
            error!("feedback webhook URL is not configured");
            return error_response(HttpStatusCode::INTERNAL_SERVER_ERROR, "Worker not configured");
        };

        let Ok(body) = serde_json::from_slice::<Value>(request.body().as_bytes()) else {
            return error_response(HttpStatusCode::BAD_REQUEST, "Invalid JSON body");
        };

        let (Some(full_name), Some(email), Some(feedback)) = (
            trimmed_field(&body, "fullName"),
            trimmed_field(&body, "email"),
            trimmed_field(&body, "feedback"),
        ) else {
            return error_response(HttpStatusCode::BAD_REQUEST, "Missing required fields");
        };

        if !self.email_pattern.is_match(&email) {
            return error_response(HttpStatusCode::BAD_REQUEST, "Invalid email address");
        }

        let submission = Feedback {
            full_name,
            email,
            feedback,
        };
        self.relay(webhook_url, &submission)
    }

    fn relay(&self, webhook_url: &str, submission: &Feedback) -> MasterclassResult<HttpResponse> {
        let payload = submission.to_slack_payload().to_string();
        match self.pal.fetch(HttpRequest::post_json(webhook_url, payload)) {
            Ok(response) if response.status().is_success() => {
                info!(email = %submission.email, "feedback relayed");
                json_response(
                    HttpStatusCode::OK,
                    &SuccessBody {
                        success: true,
                        message: "Feedback submitted successfully",
                    },
                )
            }
            Ok(response) => {
                error!(status = %response.status(), "webhook rejected feedback");
                error_response(HttpStatusCode::INTERNAL_SERVER_ERROR, "Failed to send to Slack")
            }
            Err(e) => {
                error!(error = %e, "webhook request failed");
                error_response(HttpStatusCode::INTERNAL_SERVER_ERROR, "Failed to send to Slack")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use masterclass_base::MockPal;

    const WEBHOOK: &str = "https://hooks.slack.com/services/T0/B0/secret";
    const VALID: &str = r#"{"fullName":"  Ada Lovelace ","email":"ada@example.com","feedback":"Great labs!"}"#;

    fn service(mock: &MockPal) -> FeedbackService {
        FeedbackService::new(PalHandle::new(mock.clone()), Some(WEBHOOK.to_string())).unwrap()
    }

    fn post(body: &str) -> HttpRequest {
        HttpRequest::post_json("/api/feedback", body)
    }

    fn assert_error(response: &HttpResponse, status: u16, error: &str) {
        assert_eq!(response.status().as_u16(), status);
        assert_eq!(
            response.body().as_str().unwrap(),
            format!(r#"{{"error":"{}"}}"#, error)
        );
        assert_eq!(response.headers().get("Content-Type"), Some("application/json"));
        assert_eq!(response.headers().get("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_options_preflight() {
        let mock = MockPal::new();
        let response = service(&mock)
            .handle(&HttpRequest::new(HttpMethod::Options, "/api/feedback"))
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert_eq!(
            response.headers().get("Access-Control-Allow-Methods"),
            Some("POST, OPTIONS")
        );
        assert_eq!(
            response.headers().get("Access-Control-Allow-Headers"),
            Some("Content-Type")
        );
    }

    #[test]
    fn test_method_not_allowed() {
        let mock = MockPal::new();
        let response = service(&mock)
            .handle(&HttpRequest::get("/api/feedback"))
            .unwrap();
        assert_error(&response, 405, "Method not allowed");
    }

    #[test]
    fn test_not_configured() {
        let mock = MockPal::new();
        let service = FeedbackService::new(PalHandle::new(mock.clone()), None).unwrap();
        let response = service.handle(&post("not even json")).unwrap();
        assert_error(&response, 500, "Worker not configured");
        assert!(mock.fetched_requests().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let mock = MockPal::new();
        let response = service(&mock).handle(&post("{nope")).unwrap();
        assert_error(&response, 400, "Invalid JSON body");
    }

    #[test]
    fn test_missing_fields() {
        let mock = MockPal::new();
        let service = service(&mock);
        for body in [
            r#"{"fullName":"Ada","email":"ada@example.com"}"#,
            r#"{"fullName":"   ","email":"ada@example.com","feedback":"x"}"#,
            r#"{"fullName":"Ada","email":42,"feedback":"x"}"#,
            "null",
            "[]",
        ] {
            let response = service.handle(&post(body)).unwrap();
            assert_error(&response, 400, "Missing required fields");
        }
        assert!(mock.fetched_requests().is_empty());
    }

    #[test]
    fn test_invalid_email() {
        let mock = MockPal::new();
        let service = service(&mock);
        for email in ["ada", "ada@example", "a da@example.com", "ada@@example.com"] {
            let body = json!({"fullName": "Ada", "email": email, "feedback": "x"}).to_string();
            let response = service.handle(&post(&body)).unwrap();
            assert_error(&response, 400, "Invalid email address");
        }
    }

    #[test]
    fn test_relays_trimmed_submission() {
        let mock = MockPal::new();
        mock.add_response(WEBHOOK, HttpResponse::text("ok"));

        let response = service(&mock).handle(&post(VALID)).unwrap();

        assert_eq!(response.status(), HttpStatusCode::OK);
        assert_eq!(
            response.body().as_str().unwrap(),
            r#"{"success":true,"message":"Feedback submitted successfully"}"#
        );

        let sent = mock.fetched_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method(), HttpMethod::Post);
        assert_eq!(sent[0].target(), WEBHOOK);
        assert_eq!(sent[0].headers().get("Content-Type"), Some("application/json"));
        let payload: Value = serde_json::from_slice(sent[0].body().as_bytes()).unwrap();
        expect![[r#"
            {
              "blocks": [
                {
                  "text": {
                    "text": "New Feedback Received",
                    "type": "plain_text"
                  },
                  "type": "header"
                },
                {
                  "fields": [
                    {
                      "text": "*Name:*\nAda Lovelace",
                      "type": "mrkdwn"
                    },
                    {
                      "text": "*Email:*\nada@example.com",
                      "type": "mrkdwn"
                    }
                  ],
                  "type": "section"
                },
                {
                  "text": {
                    "text": "*Feedback:*\nGreat labs!",
                    "type": "mrkdwn"
                  },
                  "type": "section"
                }
              ],
              "text": "New Feedback Received"
            }"#]]
        .assert_eq(&serde_json::to_string_pretty(&payload).unwrap());
    }

    #[test]
    fn test_webhook_rejection() {
        let mock = MockPal::new();
        mock.add_response(WEBHOOK, HttpResponse::new(HttpStatusCode::from(403)));
        let response = service(&mock).handle(&post(VALID)).unwrap();
        assert_error(&response, 500, "Failed to send to Slack");
    }

    #[test]
    fn test_webhook_unreachable() {
        let mock = MockPal::new();
        mock.add_fetch_failure(WEBHOOK, "dns failure");
        let response = service(&mock).handle(&post(VALID)).unwrap();
        assert_error(&response, 500, "Failed to send to Slack");
    }
}
