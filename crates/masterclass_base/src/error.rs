use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::SpanTrace;

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- No dependencies to compile and integrate
- More transparency into error handling logic
 */

/// Error variants that can occur in masterclass operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An outgoing HTTP request could not be completed
    HttpError { url: String, message: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

/* 📖 # Why separate ErrorKind and MasterclassError?
ErrorKind holds the structural variant that callers can match on.
MasterclassError wraps it with the context chain attached during propagation
and the span trace captured where the error was created.
*/

/// Error type wrapping [`ErrorKind`] with a context chain and a span trace.
pub struct MasterclassError {
    kind: ErrorKind,
    context: Vec<String>,
    span_trace: SpanTrace,
}

impl MasterclassError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a message error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Creates an error for a failed outgoing HTTP request.
    pub fn http(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HttpError {
            url: url.into(),
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the attached context in the order it was attached.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

impl From<ErrorKind> for MasterclassError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for MasterclassError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            ErrorKind::HttpError { .. } | ErrorKind::Message { .. } => None,
        }
    }
}

impl fmt::Display for MasterclassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }

        match &self.kind {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::HttpError { url, message } => {
                write!(f, "HTTP request to {} failed: {}", url, message)
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

impl fmt::Debug for MasterclassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::FileError { path, source } => {
                writeln!(f, "File error at {}: {}", path.display(), source)?
            }
            ErrorKind::HttpError { url, message } => {
                writeln!(f, "HTTP request to {} failed: {}", url, message)?
            }
            ErrorKind::Message { message } => writeln!(f, "{}", message)?,
        }
        let count = self.context.len();
        for (i, ctx) in self.context.iter().enumerate() {
            let branch = if i + 1 == count { "└─" } else { "├─" };
            writeln!(f, "{} {}", branch, ctx)?;
        }
        let trace = self.span_trace.to_string();
        if !trace.is_empty() {
            writeln!(f, "Trace: {}", trace)?;
        }
        Ok(())
    }
}

/* 📖 # Why use Box<MasterclassError> in the result type?

Boxing the error reduces the size of the result type, making it more efficient to return in the common case.
*/

/// Standard result type for masterclass operations.
pub type MasterclassResult<T> = std::result::Result<T, Box<MasterclassError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> MasterclassResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> MasterclassResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for MasterclassResult<T> {
    fn context(self, context: impl Into<String>) -> MasterclassResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> MasterclassResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Build a boxed message error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::MasterclassError::message(format!($($arg)*)))
    };
}

/// Return early with a boxed message error.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
