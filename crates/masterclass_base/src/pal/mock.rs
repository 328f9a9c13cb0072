use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use parking_lot::Mutex;

use crate::error::ErrorKind;
use crate::{MasterclassError, MasterclassResult};

use super::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::Pal;

/* 📖 # Why does MockPal answer fetches from a URL table?

Search and feedback tests need to control exactly what the index endpoint or
the webhook returns: a valid index, a 404, a non-JSON body, or no response at
all. Registering an outcome per URL and recording every outgoing request makes
both the inputs and the side effects of a test visible.
*/

/// In-memory PAL implementation for testing.
///
/// ```
/// use masterclass_base::pal::http::{HttpRequest, HttpResponse, HttpStatusCode};
/// use masterclass_base::{MockPal, Pal};
///
/// let mock = MockPal::new();
/// mock.add_response(
///     "https://site.example/query-index.json",
///     HttpResponse::json(HttpStatusCode::OK, r#"{"data":[]}"#),
/// );
/// let response = mock
///     .fetch(HttpRequest::get("https://site.example/query-index.json"))
///     .unwrap();
/// assert!(response.status().is_success());
/// assert_eq!(mock.fetched_requests().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    responses: Arc<Mutex<HashMap<String, FetchOutcome>>>,
    fetched: Arc<Mutex<Vec<HttpRequest>>>,
    http_servers: Arc<Mutex<HashMap<u16, Box<dyn HttpService>>>>,
    next_port: Arc<AtomicU16>,
}

#[derive(Debug, Clone)]
enum FetchOutcome {
    Respond(HttpResponse),
    Fail(String),
}

impl MockPal {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            responses: Arc::new(Mutex::new(HashMap::new())),
            fetched: Arc::new(Mutex::new(Vec::new())),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
        }
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: impl Into<Vec<u8>>) {
        self.files.lock().insert(path, content.into());
    }

    /// Answer fetches of `url` with `response`.
    pub fn add_response(&self, url: impl Into<String>, response: HttpResponse) {
        self.responses
            .lock()
            .insert(url.into(), FetchOutcome::Respond(response));
    }

    /// Make fetches of `url` fail as if the connection could not be made.
    pub fn add_fetch_failure(&self, url: impl Into<String>, message: impl Into<String>) {
        self.responses
            .lock()
            .insert(url.into(), FetchOutcome::Fail(message.into()));
    }

    /// All outgoing requests made so far, oldest first.
    pub fn fetched_requests(&self) -> Vec<HttpRequest> {
        self.fetched.lock().clone()
    }

    /// Invoke the service registered on `port` as if a client had sent `request`.
    pub fn simulate_request(
        &self,
        port: u16,
        request: HttpRequest,
    ) -> MasterclassResult<HttpResponse> {
        let servers = self.http_servers.lock();
        let service = servers
            .get(&port)
            .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?;
        service.handle_request(request)
    }

    /// Get the number of registered HTTP servers.
    pub fn http_server_count(&self) -> usize {
        self.http_servers.lock().len()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> MasterclassResult<bool> {
        Ok(self.files.lock().contains_key(path))
    }

    fn read_file(&self, path: &FilePath) -> MasterclassResult<Box<dyn Read + 'static>> {
        let content = self.files.lock().get(path).cloned().ok_or_else(|| {
            Box::new(MasterclassError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ),
            }))
        })?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn fetch(&self, request: HttpRequest) -> MasterclassResult<HttpResponse> {
        let url = request.target().to_string();
        self.fetched.lock().push(request);
        match self.responses.lock().get(&url) {
            Some(FetchOutcome::Respond(response)) => Ok(response.clone()),
            Some(FetchOutcome::Fail(message)) => {
                Err(Box::new(MasterclassError::http(url, message.clone())))
            }
            None => Err(Box::new(MasterclassError::http(
                url,
                "no response registered in MockPal",
            ))),
        }
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> MasterclassResult<HttpServerHandle> {
        let port = match config.port {
            Some(p) => p,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };
        self.http_servers.lock().insert(port, service);
        Ok(HttpServerHandle::new(port))
    }
}
