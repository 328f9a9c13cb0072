use std::io::Read;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::{MasterclassError, MasterclassResult};

use super::file_path::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};

/* 📖 # What is the Platform Abstraction Layer (PAL)?

Everything the engine does outside its own memory goes through the Pal trait:
reading the config file or a local query index, fetching the remote index,
posting to the chat webhook, and serving HTTP. RealPal does this for real;
MockPal keeps files and canned HTTP responses in memory so the search
pipeline and the feedback relay can be tested deterministically.
*/

/// Platform Abstraction Layer trait.
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> MasterclassResult<bool>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> MasterclassResult<Box<dyn Read + 'static>>;

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> MasterclassResult<String> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| {
            Box::new(MasterclassError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: e,
            }))
        })?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Perform an outgoing HTTP request. `request.target()` is the absolute URL.
    ///
    /// Any response the server sends back is `Ok`, whatever its status;
    /// `Err` means no response was received.
    fn fetch(&self, request: HttpRequest) -> MasterclassResult<HttpResponse>;

    /// Start an HTTP server with the given service.
    ///
    /// The server runs until the returned handle (and all its clones) is
    /// dropped or `shutdown()` is called on it.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> MasterclassResult<HttpServerHandle>;
}

/// Shared handle to a PAL implementation.
///
/// ```
/// use masterclass_base::{MockPal, PalHandle};
///
/// let pal = PalHandle::new(MockPal::new());
/// let shared = pal.clone();
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
