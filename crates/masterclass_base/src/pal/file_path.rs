use relative_path::{RelativePath, RelativePathBuf};
use std::path::{Path, PathBuf};

/* 📖 # Why are PAL file paths relative?

Config files and local query indexes are always addressed relative to the
directory the PAL was created for (usually the site checkout). Wrapping
RelativePathBuf keeps absolute system paths out of the PAL API, and the
mock and real implementations resolve the same FilePath the same way.
*/

/// File path relative to the PAL base directory.
///
/// ```
/// use masterclass_base::FilePath;
///
/// let config = FilePath::from("masterclass.toml");
/// assert_eq!(config.to_string(), "masterclass.toml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// The path as a `RelativePath`.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// The relative portion as a std path, not yet joined to any base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.0.as_str())
    }

    /// Resolve against a base directory.
    pub fn to_path(&self, base_dir: &Path) -> PathBuf {
        self.0.to_path(base_dir)
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        // Site-relative index paths like "/query-index.json" are accepted as-is.
        Self(RelativePathBuf::from(s.trim_start_matches('/')))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
