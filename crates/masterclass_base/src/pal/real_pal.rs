use std::fs;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::{MasterclassError, MasterclassResult, error::ErrorKind};

use super::FilePath;
use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
    HttpStatusCode,
};
use super::traits::Pal;

/* 📖 # Why blocking I/O everywhere?

The search pipeline issues one request per query and the feedback relay one
request per submission. Blocking reqwest for outgoing calls and tiny_http's
thread-per-request model for incoming ones cover that without an async runtime.
*/

/// How often the accept loop checks the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// PAL implementation backed by the real filesystem and network.
///
/// File paths are resolved relative to the configured base directory.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl RealPal {
    /// Create a RealPal rooted at `base_dir`.
    pub fn new(base_dir: PathBuf) -> MasterclassResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| crate::err!("Failed to create HTTP client: {}", e))?;
        Ok(Self { base_dir, client })
    }

    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        path.to_path(&self.base_dir)
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> MasterclassResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.exists();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> MasterclassResult<Box<dyn Read + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Box::new(MasterclassError::new(ErrorKind::FileError {
                path: resolved,
                source: e,
            }))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.target()))]
    fn fetch(&self, request: HttpRequest) -> MasterclassResult<HttpResponse> {
        let url = request.target().to_string();
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| Box::new(MasterclassError::http(&url, e.to_string())))?;

        let mut builder = self.client.request(method, &url);
        for (key, value) in request.headers().iter() {
            builder = builder.header(key, value);
        }
        if !request.body().is_empty() {
            builder = builder.body(request.body().as_bytes().to_vec());
        }

        let upstream = builder.send().map_err(|e| {
            debug!(error = %e, "request failed");
            Box::new(MasterclassError::http(&url, e.to_string()))
        })?;

        let mut response = HttpResponse::new(HttpStatusCode::from(upstream.status().as_u16()));
        for (name, value) in upstream.headers() {
            if let Ok(value) = value.to_str() {
                response = response.with_header(name.as_str(), value);
            }
        }
        let body = upstream
            .bytes()
            .map_err(|e| Box::new(MasterclassError::http(&url, e.to_string())))?;
        debug!(status = %response.status(), bytes = body.len(), "received response");
        Ok(response.with_body(body.to_vec()))
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> MasterclassResult<HttpServerHandle> {
        let address = config.address();
        let server = tiny_http::Server::http(&address)
            .map_err(|e| crate::err!("Failed to bind HTTP server to {}: {}", address, e))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server at {} has no IP address", address))?;

        let handle = HttpServerHandle::new(port);
        let shutdown = handle.shutdown_flag();
        let service: Arc<dyn HttpService> = Arc::from(service);
        thread::Builder::new()
            .name(format!("http-accept-{}", port))
            .spawn(move || accept_loop(server, service, shutdown))
            .map_err(|e| crate::err!("Failed to spawn HTTP accept thread: {}", e))?;

        info!(host = %config.host, port, "HTTP server listening");
        Ok(handle)
    }
}

fn accept_loop(server: tiny_http::Server, service: Arc<dyn HttpService>, shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(ACCEPT_POLL_INTERVAL) {
            Ok(Some(request)) => {
                let service = Arc::clone(&service);
                thread::spawn(move || handle_connection(request, service.as_ref()));
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "HTTP accept loop failed");
                break;
            }
        }
    }
    info!("HTTP server stopped");
}

fn handle_connection(mut request: tiny_http::Request, service: &dyn HttpService) {
    let response = match to_http_request(&mut request) {
        Some(incoming) => {
            debug!(method = %incoming.method(), target = incoming.target(), "handling request");
            service.handle_request(incoming).unwrap_or_else(|e| {
                error!(error = %e, "service failed to handle request");
                HttpResponse::new(HttpStatusCode::SERVICE_FAILURE)
                    .with_content_type("text/plain")
                    .with_body(e.to_string())
            })
        }
        None => HttpResponse::new(HttpStatusCode::METHOD_NOT_ALLOWED),
    };

    let status = response.status().as_u16();
    let headers: Vec<tiny_http::Header> = response
        .headers()
        .iter()
        .filter_map(|(key, value)| tiny_http::Header::from_bytes(key.as_bytes(), value.as_bytes()).ok())
        .collect();
    let body = response.into_body().into_bytes();
    let length = body.len();
    let reply = tiny_http::Response::new(
        tiny_http::StatusCode(status),
        headers,
        Cursor::new(body),
        Some(length),
        None,
    );
    if let Err(e) = request.respond(reply) {
        warn!(error = %e, "failed to write HTTP response");
    }
}

fn to_http_request(request: &mut tiny_http::Request) -> Option<HttpRequest> {
    let method = HttpMethod::parse(request.method().as_str())?;
    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        warn!(error = %e, "failed to read request body");
    }
    let mut incoming = HttpRequest::new(method, request.url()).with_body(body);
    for header in request.headers() {
        incoming = incoming.with_header(header.field.as_str().as_str(), header.value.as_str());
    }
    Some(incoming)
}
