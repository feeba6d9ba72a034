// Centralized error handling module
// Error types with context for manifest loading, hashing and store operations

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for manifest operations
///
/// Hashing failures inside a batch never surface here; they are logged and
/// the affected hash is treated as absent. Only problems the caller must act
/// on (unreadable or corrupt manifests, conflicting adds, unknown paths)
/// become errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File system errors with context
    #[error("File not found: {}\nSuggestion: Check that the file path is correct and the file exists", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Permission denied while {operation} file: {}\nSuggestion: Check file permissions or run with appropriate privileges", .path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("{}", describe_io(.path, .operation, .source))]
    IoError {
        path: Option<PathBuf>,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Manifest format errors
    #[error("Error parsing yamanifest file {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("Malformed yamanifest file {}: {reason}", .path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    /// Header `format` tag missing or not `yamanifest`
    #[error("{}", describe_format(.found))]
    FormatMismatch { found: Option<String> },

    /// Store errors
    #[error("Hash {kind} for {path} already exists with a different value\nSuggestion: Use force to overwrite the recorded value")]
    HashExists { path: String, kind: String },

    #[error("{path} does not exist in manifest")]
    PathNotFound { path: String },

    #[error("Unsupported hash algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Caller errors
    #[error("Invalid arguments: {message}\nSuggestion: Run with --help to see usage information")]
    InvalidArguments { message: String },
}

fn describe_io(path: &Option<PathBuf>, operation: &str, source: &io::Error) -> String {
    match path {
        Some(p) => format!(
            "I/O error while {} file {}: {}\nSuggestion: Check file permissions and disk space",
            operation,
            p.display(),
            source
        ),
        None => format!(
            "I/O error while {}: {}\nSuggestion: Check file permissions and disk space",
            operation, source
        ),
    }
}

fn describe_format(found: &Option<String>) -> String {
    match found {
        Some(value) => format!("Not yamanifest format: {}", value),
        None => "Not yamanifest format".to_string(),
    }
}

impl ManifestError {
    /// Create an error from an io::Error with context about the operation and optional path
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(path)) => ManifestError::FileNotFound { path },
            (io::ErrorKind::PermissionDenied, Some(path)) => ManifestError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            (_, path) => ManifestError::IoError {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }
}

impl From<io::Error> for ManifestError {
    fn from(err: io::Error) -> Self {
        ManifestError::from_io_error(err, "unknown operation", None)
    }
}

pub type Result<T> = std::result::Result<T, ManifestError>;
